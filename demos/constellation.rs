//! # Constellation
//!
//! Drifting particles linked by proximity over layered waves. Particles flee
//! the pointer; clicking bursts them outward.
//!
//! Run with: `cargo run --example constellation [--reduced-motion]`

use backdrop::prelude::*;

fn main() -> Result<(), backdrop::HostError> {
    tracing_subscriber::fmt().with_env_filter("backdrop=info").init();

    let reduced_motion = std::env::args().any(|a| a == "--reduced-motion");
    let config = BackdropConfig::constellation().adapted(1280.0, reduced_motion);
    backdrop::run(config)
}
