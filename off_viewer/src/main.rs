//! Interactive viewer for OFF polygon meshes.
//!
//! Loads a mesh through [`off_mesh`], derives shading attributes, uploads
//! them to the GPU and renders under an orbit camera with four shading
//! models (Gouraud, Phong, textured, normal-mapped).

mod camera;
mod camera_control;
mod frame_rate;
mod gpu_mesh;
mod passes;
mod reload_flags;
mod runner;
mod shader_builder;
mod texture;
mod viewer;

use std::sync::{Arc, Mutex};

#[cfg(debug_assertions)]
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};

#[cfg(debug_assertions)]
use std::path::Path;

/// App entry point.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let reload = Arc::new(Mutex::new(reload_flags::ReloadFlags::default()));

    // Watch the shaders folder: when a shader is saved, the pipeline is
    // recreated on the next frame. Only enabled in native debug mode.
    #[cfg(debug_assertions)]
    {
        let path = "off_viewer/shaders";
        log::info!("Watching {path}");
        let reload = reload.clone();
        std::thread::spawn(move || {
            if let Err(error) = watch(path, &reload) {
                log::error!("Could not watch shaders folder: {error:?}");
            }
        });
    }

    runner::start_app(&reload);
}

/// Watch the shader folder and flag every modified file for reload.
#[cfg(debug_assertions)]
fn watch<P: AsRef<Path>>(
    path: P,
    reload: &Arc<Mutex<reload_flags::ReloadFlags>>,
) -> notify::Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    watcher.watch(path.as_ref(), RecursiveMode::Recursive)?;

    for res in rx {
        match res {
            Ok(event) => {
                log::info!("Change: {:?}", event.paths);
                let mut reload = reload.lock().unwrap();
                event.paths.iter().for_each(|p| {
                    let shader_path = p.to_str().unwrap().to_owned();
                    reload.shaders.push(shader_path);
                });
            }
            Err(error) => log::error!("Error: {error:?}"),
        }
    }

    Ok(())
}
