// Flight-log replay tool: feeds a recorded flight through the return-path
// buffer sample by sample and writes out the flyback trajectory it would
// fly if RTL were triggered at the end.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use breadcrumb::config::PathConfig;
use breadcrumb::flight_log::{flyback_to_gpx, parse_gpx, LocalTangentPlane};
use breadcrumb::path_buffer::ReturnPath;

fn main() -> Result<()> {
    breadcrumb::logging::init();

    let mut args = std::env::args().skip(1);
    let log_path = match args.next() {
        Some(p) => p,
        None => bail!("usage: breadcrumb <flight-log.gpx> [flyback-out.gpx]"),
    };
    let out_path = args.next();

    let bytes =
        std::fs::read(&log_path).with_context(|| format!("reading flight log {log_path}"))?;
    let log = parse_gpx(&bytes).context("parsing flight log")?;
    info!(
        fixes = log.samples.len(),
        duration_s = log.duration_seconds(),
        "loaded flight log"
    );

    let home = log.samples[0];
    let frame = LocalTangentPlane::new(home.lat, home.lon, home.ele_m);
    let mut path = ReturnPath::new(
        frame.to_local(home.lat, home.lon, home.ele_m),
        PathConfig::default(),
    );

    for sample in &log.samples[1..] {
        let p = frame.to_local(sample.lat, sample.lon, sample.ele_m);
        if path.append_if_far_enough(p).is_err() || path.routine_cleanup().is_err() {
            warn!("buffer exhausted; stopping replay with best-effort trail");
            break;
        }
    }

    let stats = serde_json::to_string(&path.stats()).context("serializing stats")?;
    info!(stats = %stats, "replay complete");

    let flyback = path.get_flyback_path();
    info!(points = flyback.len(), "computed flyback path");

    let name = log.name.as_deref().unwrap_or("flyback");
    let gpx = flyback_to_gpx(&flyback, &frame, name);
    match out_path {
        Some(out) => {
            std::fs::write(&out, gpx).with_context(|| format!("writing flyback GPX {out}"))?;
            info!(out = %out, "wrote flyback GPX");
        }
        None => println!("{gpx}"),
    }
    Ok(())
}
