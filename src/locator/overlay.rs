//! Ad-overlay dismissal
//!
//! The bookstore page occasionally gets an ad overlay injected by a
//! third-party network, inside an arbitrarily nested iframe whose markup is
//! not under the application's control. This routine hunts for a dismiss
//! control across the current frame set and clicks the first visible match.
//! Absence of an overlay is a normal outcome, and nothing that goes wrong
//! here may abort the test assertions that follow, so every per-candidate
//! failure is absorbed at the narrowest possible scope.

use crate::driver::PageDriver;
use crate::locator::Selector;
use tracing::{debug, info, warn};

/// Dismiss-control candidates, tried in this order within each frame.
fn candidates() -> [Selector; 7] {
    [
        Selector::button("Close ad"),
        Selector::button("Close"),
        Selector::css("#ad_position_box button"),
        Selector::css(".close-ad"),
        Selector::css(".close"),
        Selector::css("[aria-label=\"close\"]"),
        Selector::css("[aria-label=\"Close\"]"),
    ]
}

/// Best-effort search for a visible "close advertisement" control.
///
/// Frames are visited in the order the page enumerates them; within each
/// frame the candidates are tried in fixed priority order. The first
/// candidate that is currently visible is clicked once and the procedure
/// stops. A failing visibility probe counts as "not visible" (the frame may
/// have detached mid-check); a failing click is swallowed and the search
/// continues. At most one element is successfully clicked per call, and the
/// procedure never returns an error.
pub async fn dismiss_ad_overlay(driver: &dyn PageDriver) {
    let frames = match driver.frames().await {
        Ok(frames) => frames,
        Err(err) => {
            debug!(%err, "frame enumeration failed; skipping overlay dismissal");
            return;
        }
    };

    for frame in &frames {
        for selector in candidates() {
            let visible = match driver.is_visible(frame, &selector).await {
                Ok(visible) => visible,
                Err(err) => {
                    debug!(%err, %selector, frame = frame.frame_id(), "visibility probe failed; treating as hidden");
                    false
                }
            };
            if !visible {
                continue;
            }

            match driver.click(frame, &selector).await {
                Ok(()) => {
                    info!(%selector, frame = frame.frame_id(), "dismissed ad overlay");
                    return;
                }
                Err(err) => {
                    warn!(%err, %selector, "overlay click failed; trying next candidate");
                }
            }
        }
    }

    debug!("no ad overlay present");
}
