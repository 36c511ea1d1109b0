//! Stepping through the samples of a loaded log.

use crate::panels::{PanelKind, PanelSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Running,
    Paused,
    Stopped,
}

/// What one call to [`Playback::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The index moved to the contained sample.
    Advanced(usize),
    /// Paused; the index stays at the contained sample, or before the first
    /// one if nothing was shown yet.
    Held(Option<usize>),
    /// End of the log reached or stopped.
    Finished,
}

/// Which panels present again while playback is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PausePolicy {
    #[default]
    All,
    None,
}

#[derive(Debug, Clone)]
pub struct Playback {
    len: usize,
    stride: usize,
    next: usize,
    current: Option<usize>,
    state: PlaybackState,
    active: Vec<PanelKind>,
}

impl Playback {
    /// A running playback over `len` samples. A `stride` of 0 is treated
    /// as 1.
    pub fn new(len: usize, stride: usize, active: &[PanelKind]) -> Self {
        Self {
            len,
            stride: stride.max(1),
            next: 0,
            current: None,
            state: PlaybackState::Running,
            active: active.to_vec(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Index of the sample shown last.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn active(&self) -> &[PanelKind] {
        &self.active
    }

    /// Running or paused.
    pub fn is_live(&self) -> bool {
        self.state != PlaybackState::Stopped
    }

    /// Switch between running and paused. Returns `true` if paused now.
    /// A stopped playback stays stopped.
    pub fn toggle_pause(&mut self) -> bool {
        self.state = match self.state {
            PlaybackState::Running => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Running,
            PlaybackState::Stopped => PlaybackState::Stopped,
        };
        self.state == PlaybackState::Paused
    }

    /// Takes effect at the next step. There is no resuming afterwards.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn step(&mut self) -> Tick {
        match self.state {
            PlaybackState::Stopped => Tick::Finished,
            PlaybackState::Paused => Tick::Held(self.current),
            PlaybackState::Running if self.next >= self.len => {
                log::info!("playback finished after sample {:?}", self.current);
                self.state = PlaybackState::Stopped;
                Tick::Finished
            }
            PlaybackState::Running => {
                let index = self.next;
                self.current = Some(index);
                self.next = index.saturating_add(self.stride);
                Tick::Advanced(index)
            }
        }
    }

    /// Step and bring the active panels in line with the result.
    pub fn tick(&mut self, panels: &mut PanelSet, policy: PausePolicy) -> Tick {
        let tick = self.step();
        match tick {
            Tick::Advanced(index) => {
                panels.advance(index, &self.active);
            }
            Tick::Held(_) if policy == PausePolicy::All => {
                panels.hold(&self.active);
            }
            Tick::Held(_) | Tick::Finished => {}
        }
        tick
    }
}
