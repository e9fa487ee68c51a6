//! # Mesh Grid
//!
//! The homepage hero background: a lattice that bends toward the pointer
//! while nearby edges light up.
//!
//! Run with: `cargo run --example mesh_grid`

use backdrop::prelude::*;

fn main() -> Result<(), backdrop::HostError> {
    tracing_subscriber::fmt().with_env_filter("backdrop=debug").init();
    backdrop::run(BackdropConfig::homepage_mesh())
}
