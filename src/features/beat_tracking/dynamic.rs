//! Dynamic-programming beat tracker
//!
//! Picks the beat sequence that maximizes onset strength at the beats while
//! keeping consecutive inter-beat intervals close to the global period.
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use crate::error::HarmonyError;

const EPSILON: f32 = 1e-10;

/// Dynamic-programming beat tracker
#[derive(Debug, Clone)]
pub struct DynamicBeatTracker {
    /// Expected beat period in envelope frames
    pub period_frames: f32,

    /// How strictly beats must follow the period (higher = stricter)
    pub tightness: f32,

    /// Drop weak beats at the start and end of the track
    pub trim: bool,
}

impl DynamicBeatTracker {
    /// Create a new tracker for the given period
    pub fn new(period_frames: f32, tightness: f32) -> Self {
        Self {
            period_frames,
            tightness,
            trim: true,
        }
    }

    /// Track beats through an onset strength envelope
    ///
    /// # Returns
    ///
    /// Ascending frame indices of the detected beats. Empty if the envelope
    /// carries no onsets.
    ///
    /// # Errors
    ///
    /// Returns `HarmonyError::InvalidInput` if the period rounds to zero frames
    /// or the tightness is not positive
    pub fn track(&self, envelope: &[f32]) -> Result<Vec<usize>, HarmonyError> {
        let period = self.period_frames.round();
        if !period.is_finite() || period < 1.0 {
            return Err(HarmonyError::InvalidInput(format!(
                "Beat period must be at least one frame, got {:.3}",
                self.period_frames
            )));
        }
        if self.tightness <= 0.0 {
            return Err(HarmonyError::InvalidInput(format!(
                "Tightness must be > 0, got {}",
                self.tightness
            )));
        }
        if envelope.iter().all(|&v| v == 0.0) {
            log::debug!("Onset envelope is empty, no beats to track");
            return Ok(Vec::new());
        }

        let period = period as usize;
        log::debug!(
            "Tracking beats: {} frames, period={} frames, tightness={}",
            envelope.len(),
            period,
            self.tightness
        );

        let normalized = normalize_by_std(envelope);
        let local = local_score(&normalized, period);
        let (backlink, cumulative) = self.forward_pass(&local, period);

        let Some(tail) = last_beat(&cumulative) else {
            return Ok(Vec::new());
        };

        let mut beats = vec![tail];
        let mut current = tail;
        while let Some(previous) = backlink[current] {
            beats.push(previous);
            current = previous;
        }
        beats.reverse();

        if self.trim {
            beats = trim_beats(&local, beats);
        }

        log::debug!("Tracked {} beats", beats.len());
        Ok(beats)
    }

    fn forward_pass(&self, local: &[f32], period: usize) -> (Vec<Option<usize>>, Vec<f32>) {
        let n = local.len();
        let nearest = ((period as f32) / 2.0).round() as usize;
        let farthest = 2 * period;

        // Transition weight for each look-back distance, farthest first
        let distances: Vec<usize> = (nearest.max(1)..=farthest).rev().collect();
        let weights: Vec<f32> = distances
            .iter()
            .map(|&d| {
                let ratio = (d as f32 / period as f32).ln();
                -self.tightness * ratio * ratio
            })
            .collect();

        let max_local = local.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let threshold = 0.01 * max_local;

        let mut backlink = vec![None; n];
        let mut cumulative = vec![0.0f32; n];
        let mut first_beat = true;

        for i in 0..n {
            let mut best_score = f32::NEG_INFINITY;
            let mut best_prev = None;
            for (&d, &weight) in distances.iter().zip(weights.iter()) {
                // Candidates before the start of the signal contribute only their weight
                let (score, prev) = if d <= i {
                    (weight + cumulative[i - d], Some(i - d))
                } else {
                    (weight, None)
                };
                if score > best_score {
                    best_score = score;
                    best_prev = prev;
                }
            }

            cumulative[i] = local[i] + best_score;

            if first_beat && local[i] < threshold {
                backlink[i] = None;
            } else {
                backlink[i] = best_prev;
                first_beat = false;
            }
        }

        (backlink, cumulative)
    }
}

fn normalize_by_std(envelope: &[f32]) -> Vec<f32> {
    let n = envelope.len();
    if n < 2 {
        return envelope.to_vec();
    }
    let mean = envelope.iter().sum::<f32>() / n as f32;
    let variance = envelope.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / (n - 1) as f32;
    let std = variance.sqrt();
    if std <= EPSILON {
        return envelope.to_vec();
    }
    envelope.iter().map(|&v| v / std).collect()
}

/// Smooth the envelope with a Gaussian spanning one period on either side
fn local_score(envelope: &[f32], period: usize) -> Vec<f32> {
    let window: Vec<f32> = (0..=2 * period)
        .map(|k| {
            let x = (k as f32 - period as f32) * 32.0 / period as f32;
            (-0.5 * x * x).exp()
        })
        .collect();

    let n = envelope.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(period);
            let hi = (i + period).min(n - 1);
            (lo..=hi)
                .map(|j| envelope[j] * window[j + period - i])
                .sum()
        })
        .collect()
}

/// Final beat: the last local maximum of the cumulative score that clears
/// half the median of all local maxima
fn last_beat(cumulative: &[f32]) -> Option<usize> {
    let n = cumulative.len();
    let is_peak = |i: usize| {
        let left = if i == 0 { cumulative[0] } else { cumulative[i - 1] };
        let right = if i + 1 == n { cumulative[i] } else { cumulative[i + 1] };
        cumulative[i] > left && cumulative[i] >= right
    };

    let mut peaks: Vec<f32> = (0..n).filter(|&i| is_peak(i)).map(|i| cumulative[i]).collect();
    if peaks.is_empty() {
        return None;
    }
    let median = median(&mut peaks);

    (0..n).rev().find(|&i| is_peak(i) && 2.0 * cumulative[i] > median)
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    }
}

/// Remove leading and trailing beats weaker than half the RMS of the
/// smoothed beat strengths
fn trim_beats(local: &[f32], beats: Vec<usize>) -> Vec<usize> {
    const SMOOTHING: [f32; 5] = [0.0, 0.5, 1.0, 0.5, 0.0];

    let strengths: Vec<f32> = beats.iter().map(|&b| local[b]).collect();
    let n = strengths.len();
    let smoothed: Vec<f32> = (0..n)
        .map(|i| {
            (0..SMOOTHING.len())
                .filter_map(|k| {
                    let j = (i + k).checked_sub(2)?;
                    strengths.get(j).map(|&s| s * SMOOTHING[k])
                })
                .sum()
        })
        .collect();

    let mean_square = smoothed.iter().map(|s| s * s).sum::<f32>() / n.max(1) as f32;
    let threshold = 0.5 * mean_square.sqrt();

    let start = smoothed.iter().position(|&s| s > threshold).unwrap_or(n);
    let end = smoothed
        .iter()
        .rposition(|&s| s > threshold)
        .map_or(start, |i| i + 1);

    beats[start..end.max(start)].to_vec()
}
