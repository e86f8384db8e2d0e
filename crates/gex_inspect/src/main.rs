// Print a summary of an OpenGEX file.
// Run with: cargo run --bin gex_inspect -- <file.ogex> [--options file.json] [--clip N --time T]

use anyhow::{bail, Context, Result};
use gex_core::{GexDocument, GexKind, LoadOptions};
use gex_math::Vec3;
use std::env;

struct Args {
    path: String,
    options: Option<String>,
    clip: u32,
    time: Option<f32>,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!(
            "Usage: {} <file.ogex> [--options file.json] [--clip N --time T]",
            args[0]
        );
    }

    let mut parsed = Args {
        path: args[1].clone(),
        options: None,
        clip: 0,
        time: None,
    };

    let mut rest = args[2..].iter();
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .with_context(|| format!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--options" => parsed.options = Some(value.clone()),
            "--clip" => parsed.clip = value.parse().context("Invalid clip index")?,
            "--time" => parsed.time = Some(value.parse().context("Invalid time")?),
            _ => bail!("Unknown argument {}", flag),
        }
    }
    Ok(parsed)
}

fn print_hierarchy(document: &GexDocument) {
    println!("\n=== Nodes ===");
    for id in document.nodes() {
        let Some(kind) = document.kind(id) else {
            continue;
        };
        let depth = document.description().tree().depth(id).saturating_sub(1);
        let label = match kind {
            GexKind::BoneNode(_) => "BoneNode",
            GexKind::GeometryNode(_) => "GeometryNode",
            GexKind::LightNode(_) => "LightNode",
            GexKind::CameraNode(_) => "CameraNode",
            _ => "Node",
        };
        let name = document.name_of(id).unwrap_or("<unnamed>");
        let position = document
            .world_transform(id)
            .map(|m| m.w_axis.truncate())
            .unwrap_or(Vec3::ZERO);
        println!(
            "{:indent$}{} \"{}\" at ({:.3}, {:.3}, {:.3})",
            "",
            label,
            name,
            position.x,
            position.y,
            position.z,
            indent = depth * 2
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args()?;

    let options = match &args.options {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read options {}", path))?;
            LoadOptions::from_json_str(&json).with_context(|| format!("Invalid options in {}", path))?
        }
        None => LoadOptions::default(),
    };

    println!("Loading OpenGEX: {}", args.path);
    let mut document = GexDocument::load_with_options(&args.path, options)
        .with_context(|| format!("Failed to load {}", args.path))?;

    let metrics = document.metrics();
    println!("\n=== Units ===");
    println!("Distance scale: {}", metrics.distance_scale);
    println!("Angle scale: {}", metrics.angle_scale);
    println!("Time scale: {}", metrics.time_scale);
    println!("Up axis: {:?} (converted to {:?})", metrics.up, document.options().target_up);
    println!("Forward axis: {:?}", metrics.forward);

    print_hierarchy(&document);

    let objects = document.objects();
    let count = |accept: fn(&GexKind) -> bool| {
        objects
            .iter()
            .filter(|&&id| document.kind(id).is_some_and(accept))
            .count()
    };
    println!("\n=== Objects ===");
    println!("Geometry objects: {}", count(|k| matches!(k, GexKind::GeometryObject(_))));
    println!("Light objects: {}", count(|k| matches!(k, GexKind::LightObject(_))));
    println!("Camera objects: {}", count(|k| matches!(k, GexKind::CameraObject(_))));
    println!("Materials: {}", document.materials().len());

    println!("\n=== Animation ===");
    println!("Animations: {}", document.animations().len());
    println!("Clips: {}", document.clips().len());
    let (begin, end) = document.time_range(args.clip);
    println!("Clip {} time range: {:.3}s to {:.3}s", args.clip, begin, end);

    if let Some(time) = args.time {
        log::info!("Evaluating clip {} at {}s", args.clip, time);
        document.evaluate(args.clip, time);
        println!("\n=== Nodes at {:.3}s ===", time);
        for id in document.nodes() {
            if let Some(world) = document.world_transform(id) {
                let p = world.w_axis.truncate();
                println!(
                    "{}: ({:.3}, {:.3}, {:.3})",
                    document.name_of(id).unwrap_or("<unnamed>"),
                    p.x,
                    p.y,
                    p.z
                );
            }
        }
    }

    Ok(())
}
