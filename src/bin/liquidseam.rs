// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error};
use image::{DynamicImage, Luma, LumaA, Rgb, Rgba};
use liquidseam::dump::{energy_to_image, visibility_to_image};
use liquidseam::{
    CarverConfig, EnergySettings, EnergyType, GradientType, Progress, ReaderType, ResizeOrder,
    SeamCarver,
};
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

// Logs every tenth of the way.
struct LogProgress {
    next: f64,
}

impl Progress for LogProgress {
    fn update(&mut self, fraction: f64) -> bool {
        if fraction >= self.next {
            debug!(done = fraction, "carving");
            self.next = (fraction + 0.1).min(1.0);
        }
        true
    }
}

fn parse_size(matches: &ArgMatches, name: &str, original: u32) -> Result<u32, Error> {
    match matches.value_of(name) {
        None => Ok(original),
        Some(v) => v
            .parse()
            .map_err(|_| format_err!("--{} expects a whole number, got '{}'", name, v)),
    }
}

fn config_from(matches: &ArgMatches) -> Result<CarverConfig, Error> {
    let mut energy = EnergySettings::default();
    if let Some(v) = matches.value_of("energy") {
        energy.energy = v.parse::<EnergyType>()?;
    }
    if let Some(v) = matches.value_of("gradient") {
        energy.gradient = v.parse::<GradientType>()?;
    }
    if let Some(v) = matches.value_of("reader") {
        energy.reader = v.parse::<ReaderType>()?;
    }
    let mut config = CarverConfig::new().with_energy(energy);
    if let Some(v) = matches.value_of("rigidity") {
        let rigidity = v
            .parse()
            .map_err(|_| format_err!("--rigidity expects a number, got '{}'", v))?;
        config = config.with_rigidity(rigidity);
    }
    if let Some(v) = matches.value_of("order") {
        config = config.with_resize_order(v.parse::<ResizeOrder>()?);
    }
    Ok(config)
}

fn load(image: &DynamicImage, config: CarverConfig) -> Result<SeamCarver, Error> {
    let carver = match image {
        DynamicImage::ImageLuma8(img) => SeamCarver::from_image(img, config)?,
        DynamicImage::ImageLumaA8(img) => SeamCarver::from_image(img, config)?,
        DynamicImage::ImageRgb8(img) => SeamCarver::from_image(img, config)?,
        DynamicImage::ImageRgba8(img) => SeamCarver::from_image(img, config)?,
        other if other.color().has_alpha() => SeamCarver::from_image(&other.to_rgba8(), config)?,
        other => SeamCarver::from_image(&other.to_rgb8(), config)?,
    };
    Ok(carver)
}

fn unload(carver: &SeamCarver) -> Result<DynamicImage, Error> {
    let image = match carver.channels() {
        1 => DynamicImage::ImageLuma8(carver.to_image::<Luma<u8>>()?),
        2 => DynamicImage::ImageLumaA8(carver.to_image::<LumaA<u8>>()?),
        3 => DynamicImage::ImageRgb8(carver.to_image::<Rgb<u8>>()?),
        4 => DynamicImage::ImageRgba8(carver.to_image::<Rgba<u8>>()?),
        n => return Err(format_err!("cannot save an image with {} channels", n)),
    };
    Ok(image)
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let input = matches.value_of("input").unwrap_or_default();
    let output = matches.value_of("output").unwrap_or_default();

    let image = image::open(input).map_err(|e| format_err!("{}: {}", input, e))?;
    let mut carver = load(&image, config_from(matches)?)?;
    let (width, height) = carver.original_dimensions();
    let target = (
        parse_size(matches, "width", width)?,
        parse_size(matches, "height", height)?,
    );
    info!(input, width, height, to_width = target.0, to_height = target.1, "loaded");

    carver.resize_with_progress(target.0, target.1, &mut LogProgress { next: 0.0 })?;
    unload(&carver)?
        .save(output)
        .map_err(|e| format_err!("{}: {}", output, e))?;
    info!(output, "saved");

    if let Some(path) = matches.value_of("energy-map") {
        energy_to_image(&carver.energy_map()).save(path)?;
        info!(path, "energy map saved");
    }
    if let Some(path) = matches.value_of("vmap") {
        visibility_to_image(carver.visibility_map()).save(path)?;
        info!(path, "visibility map saved");
    }
    Ok(())
}

fn main() {
    let matches = App::new("liquidseam")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Content-aware resizing by seam carving")
        .arg(
            Arg::with_name("input")
                .help("The image to resize")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("Where to write the result")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .takes_value(true)
                .help("Target width (defaults to the input's)"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .takes_value(true)
                .help("Target height (defaults to the input's)"),
        )
        .arg(
            Arg::with_name("energy")
                .long("energy")
                .takes_value(true)
                .possible_values(&["std", "standard", "abs", "absolute", "null"])
                .help("Energy function"),
        )
        .arg(
            Arg::with_name("gradient")
                .long("gradient")
                .takes_value(true)
                .possible_values(&["norm", "sumabs", "xabs", "null"])
                .help("Gradient function"),
        )
        .arg(
            Arg::with_name("reader")
                .long("reader")
                .takes_value(true)
                .possible_values(&["brightness", "luma", "lightness"])
                .help("How a pixel is read for the energy"),
        )
        .arg(
            Arg::with_name("rigidity")
                .long("rigidity")
                .takes_value(true)
                .help("Extra cost of each sideways seam step"),
        )
        .arg(
            Arg::with_name("order")
                .long("order")
                .takes_value(true)
                .possible_values(&["width", "height"])
                .help("Which dimension to carve first"),
        )
        .arg(
            Arg::with_name("energy-map")
                .long("energy-map")
                .takes_value(true)
                .help("Also save the result's energy map here"),
        )
        .arg(
            Arg::with_name("vmap")
                .long("vmap")
                .takes_value(true)
                .help("Also save the first pass's visibility map here"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every step"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&matches) {
        error!("{}", err);
        process::exit(1);
    }
}
