/// Config for a container
/// ## Fields
/// - `scope_id_prefix`:
///   Prefix of the identifiers given to scopes started by the container.
///   Identifiers look like `{prefix}-{number}` and are unique per container.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub scope_id_prefix: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self { scope_id_prefix: "scope" }
    }
}
