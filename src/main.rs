use anyhow::{Context, Result};
use clap::{Arg, Command};
use glam::vec3a;
use log::info;

use raytracer_scene::{Engine, Film};

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("raytracer_scene")
        .about("Loads a scene description and lays out the buffers shared with the ray tracing kernels")
        .arg(
            Arg::new("scene")
                .value_name("SCENE")
                .help("Scene description file (.test)")
                .required_unless_present("gradient"),
        )
        .arg(
            Arg::new("gradient")
                .long("gradient")
                .value_name("PNG")
                .help("Write a test gradient through the film instead of loading a scene"),
        )
        .get_matches();

    if let Some(output) = matches.get_one::<String>("gradient") {
        return write_gradient(output);
    }

    let scene_path = matches
        .get_one::<String>("scene")
        .context("no scene file given")?;

    let engine = Engine::new();
    let (scene, buffers) = engine
        .load_and_prepare(scene_path)
        .with_context(|| format!("failed to prepare {scene_path}"))?;

    println!("{scene}");
    for (label, bytes) in buffers.named_bytes() {
        println!("{label}: {} bytes", bytes.len());
    }
    println!("total: {} bytes", buffers.total_bytes());

    Ok(())
}

fn write_gradient(output: &str) -> Result<()> {
    let (width, height) = (400, 400);
    let mut film = Film::new(width, height, output);

    for x in 0..width {
        for y in 0..height {
            let color = vec3a(
                x as f32 / width as f32,
                y as f32 / height as f32,
                y as f32 / height as f32,
            );
            film.commit_color(x, y, color)?;
        }
    }

    film.save().context("could not save the gradient")?;
    info!("gradient written to {output}");
    Ok(())
}
