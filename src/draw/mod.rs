use std::collections::HashSet;
use std::sync::Mutex;

use rand::Rng;

use crate::campaign::CampaignId;
use crate::error::Error;

pub mod endpoints;
pub mod manager;
pub use endpoints::*;

/// Selection seam for the draw so tests can supply a deterministic sequence.
/// `pick` returns an index into the eligible pool; callers guarantee
/// `pool_size > 0`.
pub trait WinnerPicker: Send + Sync {
    fn pick(&self, pool_size: usize) -> usize;
}

pub struct ThreadRngPicker;

impl WinnerPicker for ThreadRngPicker {
    fn pick(&self, pool_size: usize) -> usize {
        rand::thread_rng().gen_range(0..pool_size)
    }
}

/// Serializes draws per campaign: a second draw requested while one is in
/// flight is rejected, not queued. The token lives in process memory only; a
/// crash mid-draw simply allows a fresh attempt after restart.
pub struct DrawCoordinator {
    in_flight: Mutex<HashSet<CampaignId>>,
    picker: Box<dyn WinnerPicker>,
}

impl DrawCoordinator {
    pub fn new() -> DrawCoordinator {
        DrawCoordinator::with_picker(Box::new(ThreadRngPicker))
    }

    pub fn with_picker(picker: Box<dyn WinnerPicker>) -> DrawCoordinator {
        DrawCoordinator {
            in_flight: Mutex::new(HashSet::new()),
            picker,
        }
    }

    /// Claims the campaign's draw token. The token is released when the
    /// returned guard drops, on success and failure alike.
    pub fn begin(&self, campaign_id: CampaignId) -> Result<DrawGuard<'_>, Error> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(campaign_id) {
            return Err(Error::DrawInProgress { campaign_id });
        }

        Ok(DrawGuard {
            coordinator: self,
            campaign_id,
        })
    }

    pub fn pick(&self, pool_size: usize) -> usize {
        self.picker.pick(pool_size)
    }
}

pub struct DrawGuard<'a> {
    coordinator: &'a DrawCoordinator,
    campaign_id: CampaignId,
}

impl Drop for DrawGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.coordinator.in_flight.lock().unwrap();
        in_flight.remove(&self.campaign_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_draw_on_the_same_campaign_is_rejected() {
        let coordinator = DrawCoordinator::new();
        let campaign_id = CampaignId::new();

        let guard = coordinator.begin(campaign_id).unwrap();
        let second = coordinator.begin(campaign_id);

        assert!(matches!(second, Err(Error::DrawInProgress { .. })));
        drop(guard);
    }

    #[test]
    fn draws_on_different_campaigns_proceed_concurrently() {
        let coordinator = DrawCoordinator::new();

        let guard_a = coordinator.begin(CampaignId::new()).unwrap();
        let guard_b = coordinator.begin(CampaignId::new()).unwrap();

        drop(guard_a);
        drop(guard_b);
    }

    #[test]
    fn dropping_the_guard_releases_the_token() {
        let coordinator = DrawCoordinator::new();
        let campaign_id = CampaignId::new();

        drop(coordinator.begin(campaign_id).unwrap());

        assert!(coordinator.begin(campaign_id).is_ok());
    }

    #[test]
    fn thread_rng_picker_is_roughly_uniform() {
        let picker = ThreadRngPicker;
        let pool_size = 4;
        let trials = 4000;

        let mut counts = vec![0usize; pool_size];
        for _ in 0..trials {
            counts[picker.pick(pool_size)] += 1;
        }

        // expected 1000 per slot; allow a generous band
        for (index, &count) in counts.iter().enumerate() {
            assert!(
                count > 800 && count < 1200,
                "slot {} picked {} times out of {}",
                index,
                count,
                trials
            );
        }
    }
}
