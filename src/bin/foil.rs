//! # foil
//!
//! Command line front end for the protocol core:
//!
//! * `rsagen` / `eccgen`: generate PEM keys
//! * `pubkey`: extract the public key from an RSA or EC private key PEM
//! * `vrf gen` / `vrf verify`: RSA-VRF or ECC-VRF proofs
//! * `oprf mask` / `oprf salt` / `oprf unmask`: the three EC-OPRF steps
//! * `encrypt` / `decrypt`: AES-256-GCM with a hex key or a password
//!
//! Binary values are exchanged as lowercase hex. The process exits with status 1 on any
//! error and when a proof does not verify.
use std::{fs, io, process};

use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use openssl::bn::BigNum;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foil::{
    aes, keys, Curve, CurveId, CurvePoint, EccProof, EccVrf, HashAlgorithm, Oprf, RsaVrf, VRF,
};

macro_rules! gen_validator {
    ($name:ident : $type:ty) => {
        gen_validator!($name, str::parse::<$type>);
    };
    ($name:ident, $expr:expr) => {
        fn $name(obj: String) -> Result<(), String> {
            $expr(&obj).map(drop).map_err(|x| format!("{}", x))
        }
    };
}
gen_validator!(is_hex_ok, hex::decode);
gen_validator!(is_curve_ok: CurveId);
gen_validator!(is_bits_ok: u32);

/// Minimum password length before a warning is printed (16 ASCII characters)
const MIN_PASSWORD_LEN: usize = 16;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Foil(#[from] foil::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("{0}")]
    Usage(&'static str),
    #[error("VRF proof is not valid")]
    InvalidProof,
}

type CliResult<T> = Result<T, CliError>;

fn app() -> App<'static, 'static> {
    let hex_arg = |name: &'static str, long: &'static str, help: &'static str| {
        Arg::with_name(name)
            .long(long)
            .takes_value(true)
            .validator(is_hex_ok)
            .help(help)
    };
    let curve_arg = Arg::with_name("CURVE")
        .long("curve")
        .takes_value(true)
        .default_value("p256")
        .validator(is_curve_ok)
        .help("Curve to use: p256, p384 or p521");
    let kind_args = [
        Arg::with_name("RSA")
            .long("rsa")
            .conflicts_with("ECC")
            .required_unless("ECC")
            .help("Use the RSA-VRF"),
        Arg::with_name("ECC")
            .long("ecc")
            .help("Use the ECC-VRF (experimental)"),
    ];

    App::new("foil")
        .version(crate_version!())
        .about("Verifiable random functions, an EC-OPRF and AES-256-GCM")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("VERBOSE")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log debug events to stderr (overrides RUST_LOG)"),
        )
        .arg(
            Arg::with_name("HASH")
                .long("hash")
                .takes_value(true)
                .global(true)
                .possible_values(&["sha256", "sha384", "sha512"])
                .default_value("sha256")
                .help("Hash function used by the protocols"),
        )
        .subcommand(
            SubCommand::with_name("rsagen")
                .about("Generate an RSA private key (PEM)")
                .arg(
                    Arg::with_name("BITS")
                        .long("bits")
                        .takes_value(true)
                        .default_value("2048")
                        .validator(is_bits_ok)
                        .help("Modulus size: 2048, 3072 or 4096"),
                )
                .arg(
                    Arg::with_name("OUT")
                        .long("out")
                        .takes_value(true)
                        .required(true)
                        .help("Where to write the private key"),
                )
                .arg(
                    Arg::with_name("PUB")
                        .long("pub")
                        .takes_value(true)
                        .help("Where to write the public key"),
                ),
        )
        .subcommand(
            SubCommand::with_name("eccgen")
                .about("Generate an EC key pair (PEM)")
                .arg(curve_arg.clone())
                .arg(
                    Arg::with_name("PRIV")
                        .long("priv")
                        .takes_value(true)
                        .required(true)
                        .help("Where to write the private key"),
                )
                .arg(
                    Arg::with_name("PUB")
                        .long("pub")
                        .takes_value(true)
                        .required(true)
                        .help("Where to write the public key"),
                ),
        )
        .subcommand(
            SubCommand::with_name("pubkey")
                .about("Extract the public key (PEM) from a private key")
                .arg(
                    Arg::with_name("RSA")
                        .long("rsa")
                        .conflicts_with("ECC")
                        .required_unless("ECC")
                        .help("The input is an RSA private key"),
                )
                .arg(
                    Arg::with_name("ECC")
                        .long("ecc")
                        .help("The input is an EC private key"),
                )
                .arg(
                    Arg::with_name("IN")
                        .long("in")
                        .takes_value(true)
                        .required(true)
                        .help("PEM private key"),
                )
                .arg(
                    Arg::with_name("OUT")
                        .long("out")
                        .takes_value(true)
                        .help("Where to write the public key; stdout when absent"),
                ),
        )
        .subcommand(
            SubCommand::with_name("vrf")
                .about("Generate or verify a VRF proof")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("gen")
                        .about("Generate a proof and its output")
                        .args(&kind_args)
                        .arg(
                            Arg::with_name("PRIV")
                                .long("priv")
                                .takes_value(true)
                                .required(true)
                                .help("PEM private key"),
                        )
                        .arg(
                            Arg::with_name("ALPHA")
                                .long("alpha")
                                .takes_value(true)
                                .required(true)
                                .help("VRF input"),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("verify")
                        .about("Verify a proof and its output")
                        .args(&kind_args)
                        .arg(
                            Arg::with_name("PUB")
                                .long("pub")
                                .takes_value(true)
                                .required(true)
                                .help("PEM public key"),
                        )
                        .arg(
                            Arg::with_name("ALPHA")
                                .long("alpha")
                                .takes_value(true)
                                .required(true)
                                .help("VRF input"),
                        )
                        .arg(hex_arg("BETA", "beta", "VRF output (hex)").required(true))
                        .arg(hex_arg("PROOF", "proof", "VRF proof (hex)").required(true)),
                ),
        )
        .subcommand(
            SubCommand::with_name("oprf")
                .about("EC-OPRF steps")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("mask")
                        .about("Hash data into the curve and blind it")
                        .arg(curve_arg.clone())
                        .arg(
                            Arg::with_name("DATA")
                                .long("data")
                                .takes_value(true)
                                .required(true)
                                .help("Client input"),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("salt")
                        .about("Multiply a masked point by the server secret")
                        .arg(curve_arg.clone())
                        .arg(hex_arg("X", "x", "Masked point, x coordinate (hex)").required(true))
                        .arg(hex_arg("Y", "y", "Masked point, y coordinate (hex)").required(true))
                        .arg(hex_arg("S", "s", "Server secret (hex); random when absent")),
                )
                .subcommand(
                    SubCommand::with_name("unmask")
                        .about("Remove the client blinding")
                        .arg(curve_arg)
                        .arg(hex_arg("X", "x", "Salted point, x coordinate (hex)").required(true))
                        .arg(hex_arg("Y", "y", "Salted point, y coordinate (hex)").required(true))
                        .arg(
                            hex_arg("RINV", "rinv", "Unblinding scalar from mask (hex)")
                                .required(true),
                        ),
                ),
        )
        .subcommand(aes_command("encrypt", "Encrypt with AES-256-GCM"))
        .subcommand(aes_command("decrypt", "Decrypt with AES-256-GCM"))
}

fn aes_command(name: &'static str, about: &'static str) -> App<'static, 'static> {
    SubCommand::with_name(name)
        .about(about)
        .arg(
            Arg::with_name("KEY")
                .long("key")
                .takes_value(true)
                .validator(is_hex_ok)
                .conflicts_with("PASSWORD")
                .help("256-bit key (hex)"),
        )
        .arg(
            Arg::with_name("PASSWORD")
                .long("password")
                .takes_value(true)
                .help("Password, expanded with PBKDF2-HMAC-SHA256"),
        )
        .arg(
            Arg::with_name("IN")
                .long("in")
                .takes_value(true)
                .conflicts_with("TEXTIN")
                .required_unless("TEXTIN")
                .help("Input file"),
        )
        .arg(
            Arg::with_name("TEXTIN")
                .long("textin")
                .takes_value(true)
                .help("Input given on the command line (hex when decrypting)"),
        )
        .arg(
            Arg::with_name("OUT")
                .long("out")
                .takes_value(true)
                .conflicts_with("TEXTOUT")
                .help("Output file"),
        )
        .arg(
            Arg::with_name("TEXTOUT")
                .long("textout")
                .help("Print the output to stdout (default)"),
        )
        .arg(
            Arg::with_name("ADATA")
                .long("adata")
                .takes_value(true)
                .default_value("")
                .help("Additional authenticated data"),
        )
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn value<'a>(matches: &'a ArgMatches, name: &'static str) -> CliResult<&'a str> {
    matches.value_of(name).ok_or(CliError::Usage(name))
}

fn hex_value(matches: &ArgMatches, name: &'static str) -> CliResult<Vec<u8>> {
    Ok(hex::decode(value(matches, name)?)?)
}

fn bignum_value(matches: &ArgMatches, name: &'static str) -> CliResult<BigNum> {
    Ok(BigNum::from_slice(&hex_value(matches, name)?).map_err(foil::Error::from)?)
}

fn point_value(matches: &ArgMatches) -> CliResult<CurvePoint> {
    Ok(CurvePoint::new(
        bignum_value(matches, "X")?,
        bignum_value(matches, "Y")?,
    ))
}

fn curve_value(matches: &ArgMatches) -> CliResult<Curve> {
    let id: CurveId = value(matches, "CURVE")?.parse()?;
    Ok(Curve::new(id)?)
}

fn hash_value(matches: &ArgMatches) -> HashAlgorithm {
    match matches.value_of("HASH") {
        Some("sha384") => HashAlgorithm::Sha384,
        Some("sha512") => HashAlgorithm::Sha512,
        _ => HashAlgorithm::Sha256,
    }
}

fn print_point(point: &CurvePoint) {
    println!("x: {}", hex::encode(point.x().to_vec()));
    println!("y: {}", hex::encode(point.y().to_vec()));
}

fn rsagen(matches: &ArgMatches) -> CliResult<()> {
    let bits: u32 = value(matches, "BITS")?
        .parse()
        .map_err(|_| CliError::Usage("BITS"))?;
    let key = keys::generate_rsa_key(bits)?;
    fs::write(value(matches, "OUT")?, keys::rsa_private_key_to_pem(&key)?)?;
    if let Some(path) = matches.value_of("PUB") {
        let public = keys::rsa_public_key(&key)?;
        fs::write(path, keys::rsa_public_key_to_pem(&public)?)?;
    }
    info!(bits, "RSA key written");
    Ok(())
}

fn eccgen(matches: &ArgMatches) -> CliResult<()> {
    let curve = curve_value(matches)?;
    let key = keys::generate_ec_key(&curve)?;
    fs::write(value(matches, "PRIV")?, keys::ec_private_key_to_pem(&key)?)?;
    fs::write(value(matches, "PUB")?, keys::ec_public_key_to_pem(&key)?)?;
    info!("EC key pair written");
    Ok(())
}

fn pubkey(matches: &ArgMatches) -> CliResult<()> {
    let pem = fs::read(value(matches, "IN")?)?;
    let public = if matches.is_present("RSA") {
        keys::rsa_public_pem_from_private_pem(&pem)?
    } else {
        keys::ec_public_pem_from_private_pem(&pem)?
    };
    match matches.value_of("OUT") {
        Some(path) => {
            fs::write(path, &public)?;
            info!("public key written");
        }
        None => print!("{}", String::from_utf8_lossy(&public)),
    }
    Ok(())
}

fn vrf_gen(matches: &ArgMatches, hash: HashAlgorithm) -> CliResult<()> {
    let pem = fs::read(value(matches, "PRIV")?)?;
    let alpha = value(matches, "ALPHA")?.as_bytes();

    let (pi, beta) = if matches.is_present("RSA") {
        let key = keys::rsa_private_key_from_pem(&pem)?;
        RsaVrf::new(hash).prove(&key, alpha)?
    } else {
        let key = keys::ec_private_key_from_pem(&pem)?;
        let curve = keys::ec_key_curve(&key)?;
        let (pi, beta) = EccVrf::new(&curve, hash).prove(&key, alpha)?;
        (pi.to_bytes(&curve)?, beta)
    };

    println!("proof: {}", hex::encode(&pi));
    println!("beta: {}", hex::encode(&beta));
    Ok(())
}

fn vrf_verify(matches: &ArgMatches, hash: HashAlgorithm) -> CliResult<()> {
    let pem = fs::read(value(matches, "PUB")?)?;
    let alpha = value(matches, "ALPHA")?.as_bytes();
    let beta = hex_value(matches, "BETA")?;
    let pi = hex_value(matches, "PROOF")?;

    let valid = if matches.is_present("RSA") {
        let key = keys::rsa_public_key_from_pem(&pem)?;
        RsaVrf::new(hash).verify(&key, alpha, &beta, &pi)?
    } else {
        let key = keys::ec_public_key_from_pem(&pem)?;
        let curve = keys::ec_key_curve(&key)?;
        let pi = EccProof::from_bytes(&curve, &pi)?;
        EccVrf::new(&curve, hash).verify(&key, alpha, &beta, &pi)?
    };

    if !valid {
        return Err(CliError::InvalidProof);
    }
    println!("VRF proof is valid!");
    Ok(())
}

fn oprf_mask(matches: &ArgMatches, hash: HashAlgorithm) -> CliResult<()> {
    let curve = curve_value(matches)?;
    let (masked, r_inv) = Oprf::new(&curve, hash).mask(value(matches, "DATA")?.as_bytes())?;
    print_point(&masked);
    println!("rinv: {}", hex::encode(r_inv.to_vec()));
    Ok(())
}

fn oprf_salt(matches: &ArgMatches, hash: HashAlgorithm) -> CliResult<()> {
    let curve = curve_value(matches)?;
    let masked = point_value(matches)?;
    let s = match matches.value_of("S") {
        Some(_) => Some(bignum_value(matches, "S")?),
        None => None,
    };
    let (salted, s_used) = Oprf::new(&curve, hash).salt(&masked, s.as_deref())?;
    print_point(&salted);
    println!("s: {}", hex::encode(s_used.to_vec()));
    Ok(())
}

fn oprf_unmask(matches: &ArgMatches, hash: HashAlgorithm) -> CliResult<()> {
    let curve = curve_value(matches)?;
    let salted = point_value(matches)?;
    let r_inv = bignum_value(matches, "RINV")?;
    let unmasked = Oprf::new(&curve, hash).unmask(&salted, &r_inv)?;
    print_point(&unmasked);
    Ok(())
}

/// Resolves the AES key from `--key` or `--password`; encryption falls back to a random key.
fn aes_key(matches: &ArgMatches, encrypting: bool) -> CliResult<Vec<u8>> {
    if let Some(password) = matches.value_of("PASSWORD") {
        if password.len() < MIN_PASSWORD_LEN {
            warn!("the password has less than 112 bits of security");
        }
        return Ok(aes::key_from_password(
            password.as_bytes(),
            &[],
            aes::PBKDF2_ITERATIONS,
        )?);
    }
    if matches.value_of("KEY").is_some() {
        return hex_value(matches, "KEY");
    }
    if !encrypting {
        return Err(CliError::Usage("decryption needs --key or --password"));
    }
    let key = aes::random_key()?;
    warn!("no key given, a random key was generated");
    eprintln!("key: {}", hex::encode(&key));
    Ok(key)
}

fn symmetric(matches: &ArgMatches, encrypting: bool) -> CliResult<()> {
    let key = aes_key(matches, encrypting)?;
    let input = match matches.value_of("IN") {
        Some(path) => fs::read(path)?,
        None if encrypting => value(matches, "TEXTIN")?.as_bytes().to_vec(),
        None => hex_value(matches, "TEXTIN")?,
    };
    let adata = value(matches, "ADATA")?.as_bytes();

    let output = if encrypting {
        aes::encrypt(&key, &input, adata)?
    } else {
        aes::decrypt(&key, &input, adata)?
    };
    debug!(input = input.len(), output = output.len(), "AES operation done");

    match matches.value_of("OUT") {
        Some(path) => fs::write(path, &output)?,
        None if encrypting => println!("{}", hex::encode(&output)),
        None => println!("{}", String::from_utf8_lossy(&output)),
    }
    Ok(())
}

/// The innermost subcommand matches, where global arguments end up.
fn leaf<'a>(matches: &'a ArgMatches<'a>) -> &'a ArgMatches<'a> {
    match matches.subcommand() {
        (_, Some(sub)) => leaf(sub),
        _ => matches,
    }
}

fn run(matches: &ArgMatches) -> CliResult<()> {
    let hash = hash_value(leaf(matches));
    match matches.subcommand() {
        ("rsagen", Some(sub)) => rsagen(sub),
        ("eccgen", Some(sub)) => eccgen(sub),
        ("pubkey", Some(sub)) => pubkey(sub),
        ("vrf", Some(vrf)) => match vrf.subcommand() {
            ("gen", Some(sub)) => vrf_gen(sub, hash),
            ("verify", Some(sub)) => vrf_verify(sub, hash),
            _ => Err(CliError::Usage("unknown vrf command")),
        },
        ("oprf", Some(oprf)) => match oprf.subcommand() {
            ("mask", Some(sub)) => oprf_mask(sub, hash),
            ("salt", Some(sub)) => oprf_salt(sub, hash),
            ("unmask", Some(sub)) => oprf_unmask(sub, hash),
            _ => Err(CliError::Usage("unknown oprf command")),
        },
        ("encrypt", Some(sub)) => symmetric(sub, true),
        ("decrypt", Some(sub)) => symmetric(sub, false),
        _ => Err(CliError::Usage("unknown command")),
    }
}

fn main() {
    let matches = app().get_matches();
    init_tracing(matches.is_present("VERBOSE") || leaf(&matches).is_present("VERBOSE"));

    if let Err(e) = run(&matches) {
        error!("{}", e);
        process::exit(1);
    }
}
