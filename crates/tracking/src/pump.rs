use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, Receiver, TrySendError};
use tokio::runtime::Handle;
use parking_lot::Mutex;

use crate::session::{TickReport, TrackingSession};
use crate::sinks::{GeocodeError, GeocodedAddress, ReverseGeocoder};
use crate::{channel, FixRx, LocationSource};

type GeocodeResult = Result<Option<GeocodedAddress>, GeocodeError>;

/// Reports held for the caller before new ones are dropped.
pub const REPORT_BACKLOG: usize = 256;

pub struct PumpHandle {
    pub thread: JoinHandle<()>,
    pub reports: Receiver<TickReport>,
}

/// Drive `session` from `source` until the source hangs up.
///
/// The source runs on `rt`; fixes are drained in FIFO order on a dedicated
/// thread that holds the session lock for one fix at a time. Reverse geocoding
/// runs as separate tasks on `rt` whose results are applied between fixes.
/// At most [`REPORT_BACKLOG`] undrained reports are kept; later ones are
/// dropped, the session still sees every fix.
pub fn pump<S: LocationSource + 'static>(
    source: S,
    session: Arc<Mutex<TrackingSession>>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    rt: &Handle,
) -> PumpHandle {
    let (tx, rx): (_, FixRx) = channel();
    let rt = rt.clone();
    rt.spawn(async move {
        if let Err(e) = source.run(tx).await {
            tracing::warn!("location source stopped: {e}");
        }
    });

    let (report_tx, reports) = crossbeam_channel::bounded::<TickReport>(REPORT_BACKLOG);
    let (geo_tx, geo_rx) = crossbeam_channel::unbounded::<GeocodeResult>();

    let thread = thread::spawn(move || loop {
        select! {
            recv(rx) -> msg => {
                let fix = match msg {
                    Ok(fix) => fix,
                    Err(_) => {
                        tracing::debug!("fix channel closed, pump exiting");
                        break;
                    }
                };
                let report = session.lock().on_fix(&fix);
                let report = match report {
                    Some(r) => r,
                    None => continue,
                };
                if let (Some((lat, lon)), Some(g)) = (report.road_lookup, geocoder.as_ref()) {
                    let g = Arc::clone(g);
                    let geo_tx = geo_tx.clone();
                    rt.spawn(async move {
                        let _ = geo_tx.send(g.reverse_geocode(lat, lon).await);
                    });
                }
                if let Err(TrySendError::Full(r)) = report_tx.try_send(report) {
                    tracing::debug!(ts = r.location.timestamp_ms, "report backlog full, dropping");
                }
            }
            recv(geo_rx) -> res => {
                if let Ok(res) = res {
                    session.lock().apply_road_name(res);
                }
            }
        }
    });

    PumpHandle { thread, reports }
}
