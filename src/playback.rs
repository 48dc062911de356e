use log::{error, info};
use serde::Deserialize;

use crate::page::MediaElement;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackPolicy {
    pub ad_rate: f64,
    pub normal_rate: f64,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            ad_rate: 16.0,
            normal_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Engaged,
    Disengaged,
}

// Edge-triggered: the current playback rate doubles as the state memory, so
// repeated calls with an unchanged ad state never re-issue mutations.
pub fn reconcile(
    media: &dyn MediaElement,
    ad_playing: bool,
    policy: &PlaybackPolicy,
) -> Option<Transition> {
    let at_ad_rate = media.playback_rate() == policy.ad_rate;

    if ad_playing && !at_ad_rate {
        info!("Ad detected, speeding up playback");
        apply(media, policy.ad_rate, true)?;
        Some(Transition::Engaged)
    } else if !ad_playing && at_ad_rate {
        info!("Ad ended, restoring playback");
        apply(media, policy.normal_rate, false)?;
        Some(Transition::Disengaged)
    } else {
        None
    }
}

fn apply(media: &dyn MediaElement, rate: f64, muted: bool) -> Option<()> {
    let result = media
        .set_playback_rate(rate)
        .and_then(|()| media.set_muted(muted));
    if let Err(err) = result {
        // The element was most likely detached mid-evaluation; the next
        // cycle re-acquires and repairs the state.
        error!("Failed to adjust media element: {err:?}");
        return None;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::FakeMedia;

    #[test]
    fn should_engage_speedup_when_ad_starts() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy::default();

        // when
        let transition = reconcile(media.as_ref(), true, &policy);

        // then
        assert_eq!(transition, Some(Transition::Engaged));
        assert_eq!(media.playback_rate(), 16.0);
        assert!(media.muted());
    }

    #[test]
    fn should_disengage_speedup_when_ad_ends() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy::default();
        reconcile(media.as_ref(), true, &policy);

        // when
        let transition = reconcile(media.as_ref(), false, &policy);

        // then
        assert_eq!(transition, Some(Transition::Disengaged));
        assert_eq!(media.playback_rate(), 1.0);
        assert!(!media.muted());
    }

    #[test]
    fn should_not_mutate_without_a_state_transition() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy::default();

        // when
        reconcile(media.as_ref(), false, &policy);

        // then
        assert_eq!(media.mutation_count(), 0);
    }

    #[test]
    fn should_be_idempotent_under_repeated_ad_state() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy::default();

        // when
        reconcile(media.as_ref(), true, &policy);
        let baseline = media.mutation_count();
        for _ in 0..5 {
            assert_eq!(reconcile(media.as_ref(), true, &policy), None);
        }

        // then
        assert_eq!(media.mutation_count(), baseline);
    }

    #[test]
    fn should_transition_exactly_twice_over_an_ad_break() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy::default();
        let samples = [false, false, true, true, true, false, false];

        // when
        let transitions: Vec<Transition> = samples
            .iter()
            .filter_map(|&ad_playing| reconcile(media.as_ref(), ad_playing, &policy))
            .collect();

        // then
        assert_eq!(
            transitions,
            vec![Transition::Engaged, Transition::Disengaged]
        );
        assert_eq!(media.playback_rate(), 1.0);
        assert!(!media.muted());
    }

    #[test]
    fn should_swallow_mutation_failures_on_detached_elements() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy::default();
        media.detach();

        // when
        let transition = reconcile(media.as_ref(), true, &policy);

        // then
        assert_eq!(transition, None);
        assert_eq!(media.mutation_count(), 0);
        assert_eq!(media.playback_rate(), 1.0);
    }

    #[test]
    fn should_honor_custom_rate_multipliers() {
        // given
        let media = FakeMedia::new(1);
        let policy = PlaybackPolicy {
            ad_rate: 8.0,
            normal_rate: 1.5,
        };

        // when
        reconcile(media.as_ref(), true, &policy);

        // then
        assert_eq!(media.playback_rate(), 8.0);

        // when
        reconcile(media.as_ref(), false, &policy);

        // then
        assert_eq!(media.playback_rate(), 1.5);
    }
}
