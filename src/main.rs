use clap::{Arg, Command};
use colored::*;
use std::error::Error;
use std::path::Path;
use std::time::Instant;

use imagelab::operations::{Operation, FACTOR_RANGE};
use imagelab::persistence::{is_image_file, OutputFormat};
use imagelab::{Session, Settings};

fn parse_operations(input: &str, brightness: f32, contrast: f32) -> Result<Vec<Operation>, Box<dyn Error>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|token| -> Result<Operation, Box<dyn Error>> {
            let op = token.parse::<Operation>()?;
            // Bare enhancer names take the factor given on the command line
            Ok(match op {
                Operation::Brightness(_) if !token.contains('=') => Operation::Brightness(brightness),
                Operation::Contrast(_) if !token.contains('=') => Operation::Contrast(contrast),
                other => other,
            })
        })
        .collect()
}

fn parse_factor(matches: &clap::ArgMatches, name: &str, fallback: f32) -> Result<f32, Box<dyn Error>> {
    let value = match matches.get_one::<String>(name) {
        Some(raw) => raw
            .parse::<f32>()
            .map_err(|_| format!("Invalid {} factor: {}", name, raw))?,
        None => return Ok(fallback),
    };
    if !FACTOR_RANGE.contains(&value) {
        return Err(format!(
            "{} factor ({}) is outside valid range [{}, {}]",
            name.red(),
            value,
            FACTOR_RANGE.start(),
            FACTOR_RANGE.end()
        )
        .into());
    }
    Ok(value)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let matches = Command::new("imagelab")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Apply image editing operations to a single image")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Image to edit (jpg, jpeg, png, bmp, tif, tiff)")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where to write the result. A missing extension defaults to .jpg")
                .required(true),
        )
        .arg(
            Arg::new("ops")
                .long("ops")
                .value_name("LIST")
                .help("Comma-separated operations applied in order: blur, sharpen, edges, emboss, brightness[=F], contrast[=F], grayscale, rotate90, rotate180, rotate270, fliph, flipv")
                .default_value(""),
        )
        .arg(
            Arg::new("brightness")
                .short('b')
                .long("brightness")
                .value_name("FACTOR")
                .help("Factor for bare 'brightness' operations (0.1 to 3.0). Default: saved setting"),
        )
        .arg(
            Arg::new("contrast")
                .short('c')
                .long("contrast")
                .value_name("FACTOR")
                .help("Factor for bare 'contrast' operations (0.1 to 3.0). Default: saved setting"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format (jpg, png, bmp, tif). Default: taken from the output extension"),
        )
        .get_matches();

    let input = Path::new(matches.get_one::<String>("input").unwrap());
    let output = Path::new(matches.get_one::<String>("output").unwrap());

    let settings = Settings::load();
    let brightness = parse_factor(&matches, "brightness", settings.brightness_factor)?;
    let contrast = parse_factor(&matches, "contrast", settings.contrast_factor)?;
    let operations = parse_operations(matches.get_one::<String>("ops").unwrap(), brightness, contrast)?;

    let format = match matches.get_one::<String>("format") {
        Some(ext) => Some(
            OutputFormat::from_extension(ext).ok_or_else(|| format!("Unsupported output format: {}", ext))?,
        ),
        None => None,
    };

    if !is_image_file(input) {
        println!(
            "{}: {} does not have a known image extension, trying anyway",
            "Warning".yellow(),
            input.display()
        );
    }

    let start_time = Instant::now();
    let mut session = Session::new();
    let info = session.load(input)?;
    println!(
        "{} {} ({}x{})",
        "Loaded".bold().blue(),
        info.filename,
        info.width,
        info.height
    );

    for op in &operations {
        session.apply(*op);
        println!("  {}: {}", "Applied".green(), op);
    }

    let written = session.save(output, format)?;
    println!("{}: {}", "Saved".bold().green(), written.display());
    println!("{}: {:.2?}", "Processing time".blue(), start_time.elapsed());
    Ok(())
}
