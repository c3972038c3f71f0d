use anyhow::Result;

use rust_embed::RustEmbed;

use std::borrow::Cow;

/// Shader helpers.
/// Shaders are embedded in the binary; in native debug builds rust-embed
/// reads them from disk instead, which is what makes hot reload work.
#[derive(RustEmbed)]
#[folder = "shaders"]
pub struct ShaderBuilder;

impl ShaderBuilder {
    /// Load a shader file.
    /// Does not do any pre-processing here, but returns the raw content.
    pub fn load(name: &str) -> Result<String> {
        Self::get(name)
            .ok_or(anyhow::anyhow!("Shader not found: {name}"))
            .and_then(|file| {
                std::str::from_utf8(file.data.as_ref())
                    .map(|x| x.to_owned())
                    .map_err(|e| anyhow::anyhow!(e))
            })
    }

    /// Build a shader file by resolving its `#import` lines.
    pub fn build(name: &str) -> Result<String> {
        Self::build_with_seen(name, &mut vec![])
    }

    /// Create a shader module from a shader file.
    pub fn create_module(device: &wgpu::Device, name: &str) -> Result<wgpu::ShaderModule> {
        let shader = ShaderBuilder::build(name)?;

        // device.create_shader_module panics if the shader is malformed
        // only check this on native debug builds.
        #[cfg(debug_assertions)]
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shader.as_str())),
        });

        #[cfg(debug_assertions)]
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!("Shader {name} is malformed: {error}")
        }

        Ok(module)
    }

    pub fn create_render_pipeline(
        device: &wgpu::Device,
        descriptor: &wgpu::RenderPipelineDescriptor,
    ) -> Result<wgpu::RenderPipeline> {
        #[cfg(debug_assertions)]
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let pipeline = device.create_render_pipeline(descriptor);

        #[cfg(debug_assertions)]
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!(
                "Render pipeline {:?} is malformed: {error}",
                descriptor.label
            )
        }

        Ok(pipeline)
    }

    /// Build a shader file by importing all its dependencies.
    /// We use seen to make sure we do not import the same file twice:
    /// wgsl does not care about import order, but it cannot define the same
    /// symbol twice.
    fn build_with_seen(name: &str, seen: &mut Vec<String>) -> Result<String> {
        // File was already included, return empty string.
        let owned_name = name.to_owned();
        if seen.contains(&owned_name) {
            return Ok("".to_owned());
        }
        seen.push(owned_name);

        Self::load(name)?
            .lines()
            .map(|line| {
                // example of valid import: #import "common.wgsl"
                if line.starts_with("#import") {
                    let include = line
                        .split('"')
                        .nth(1)
                        .expect("Invalid import syntax: expected #import \"file\"");
                    let include_content = Self::build_with_seen(include, seen)?;
                    // We keep the import commented for debugging purposes.
                    Ok(format!("//{line}\n {include_content}"))
                } else {
                    Ok(format!("{line}\n"))
                }
            })
            .collect::<Result<String>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shading_mode_shader_builds() {
        for name in [
            "gouraud.wgsl",
            "phong.wgsl",
            "texture.wgsl",
            "normal_map.wgsl",
        ] {
            let built = ShaderBuilder::build(name).unwrap();
            assert!(built.contains("fn main_vs"), "{name} misses main_vs");
            assert!(built.contains("fn main_fs"), "{name} misses main_fs");
            // The common camera/lighting block got inlined.
            assert!(built.contains("var<uniform> camera"), "{name}: no camera");
        }
    }

    #[test]
    fn test_import_is_resolved_once() {
        let built = ShaderBuilder::build("phong.wgsl").unwrap();
        assert_eq!(built.matches("var<uniform> camera").count(), 1);
    }
}
