/// Shader files modified on disk since the last pipeline rebuild.
///
/// Filled by the filesystem watcher thread, drained by the render loop.
#[derive(Debug, Default)]
pub struct ReloadFlags {
    /// Paths of shaders to reload.
    pub shaders: Vec<String>,
}
