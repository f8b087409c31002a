use anyhow::{Context, Result, ensure};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

/// Sentinel key in the offline-generated table holding the per-length total.
const TOTAL_KEY: &str = "_total";

/// Frequency table over letter fragments, produced offline from the word
/// list and keyed by fragment length. Loaded once at startup; entries are
/// sorted descending by occurrence count so band selection can index the
/// top frequency directly.
#[derive(Debug)]
pub struct FragmentTable {
    by_length: BTreeMap<u32, Vec<(String, u64)>>,
}

impl FragmentTable {
    /// Parse the offline job's JSON:
    /// `{"<length>": {"_total": n, "<fragment>": count, ...}, ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, HashMap<String, u64>> =
            serde_json::from_str(json).context("malformed fragment table")?;

        let mut by_length = BTreeMap::new();
        for (key, mut counts) in raw {
            let length: u32 = key
                .parse()
                .with_context(|| format!("fragment length key {key:?} is not a number"))?;
            counts.remove(TOTAL_KEY);
            let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            if !entries.is_empty() {
                by_length.insert(length, entries);
            }
        }
        ensure!(!by_length.is_empty(), "fragment table has no usable entries");
        Ok(Self { by_length })
    }

    pub fn min_length(&self) -> u32 {
        *self
            .by_length
            .keys()
            .next()
            .expect("fragment table is never empty")
    }

    pub fn max_length(&self) -> u32 {
        *self
            .by_length
            .keys()
            .next_back()
            .expect("fragment table is never empty")
    }

    fn nearest_length(&self, target: i64) -> u32 {
        let mut best: Option<(u32, i64)> = None;
        for &len in self.by_length.keys() {
            let distance = (len as i64 - target).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((len, distance));
            }
        }
        best.map(|(len, _)| len)
            .expect("fragment table is never empty")
    }

    /// Pick the next mandatory fragment for the given difficulty, excluding
    /// the previous one. Rising difficulty both lengthens the target
    /// fragment and narrows the allowed frequency band toward rarer
    /// fragments. An empty band falls back to any fragment of the chosen
    /// length other than the excluded one.
    pub fn select(
        &self,
        difficulty: f64,
        exclude: Option<&str>,
        rng: &mut impl Rng,
    ) -> Result<String> {
        let target = ((rng.r#gen::<f64>() + difficulty) / 5.0).ceil() as i64 + 1;
        let length = self.nearest_length(target);
        let entries = &self.by_length[&length];

        let local_difficulty = difficulty / length as f64;
        let reference = entries[0].1 as f64;
        let max_freq = reference.min(reference / local_difficulty);
        let min_freq = max_freq.powf(0.75);

        let band: Vec<&str> = entries
            .iter()
            .filter(|(fragment, freq)| {
                let freq = *freq as f64;
                freq < max_freq && freq > min_freq && Some(fragment.as_str()) != exclude
            })
            .map(|(fragment, _)| fragment.as_str())
            .collect();

        let pool = if band.is_empty() {
            tracing::debug!(difficulty, length, "empty fragment band, widening to full bucket");
            entries
                .iter()
                .filter(|(fragment, _)| Some(fragment.as_str()) != exclude)
                .map(|(fragment, _)| fragment.as_str())
                .collect()
        } else {
            band
        };

        ensure!(
            !pool.is_empty(),
            "no selectable fragment of length {length}"
        );
        Ok(pool[rng.gen_range(0..pool.len())].to_string())
    }
}
