//! Tile loader.
//!
//! Keeps a set of decoded tiles in sync with the latest [`VisibleTiles`]
//! rectangle:
//!
//! ```text
//!   update(visible)
//!        │
//!        ├── evict decoded tiles outside the rectangle ──► BitmapPool
//!        ├── abort in-flight work outside the rectangle
//!        └── spawn fetch + decode for new tiles
//!                 │
//!                 ▼
//!   TileStreamProvider ──► spawn_blocking(decode into pooled bitmap)
//!                 │
//!                 ▼
//!   completion channel ──► poll_completed() / wait_idle()
//! ```
//!
//! Every spawned request carries a generation number. A completion is only
//! applied when its request is still the live one for that key; anything
//! else is a stale result and its bitmap goes back to the pool.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

use crate::error::TileError;
use crate::provider::TileStreamProvider;
use crate::pyramid::VisibleTiles;

use super::bitmap::TileBitmap;
use super::decoder::{expected_dimension, TileDecoder};
use super::key::TileKey;
use super::pool::BitmapPool;

/// Result of fetching and decoding one tile.
enum Outcome {
    Loaded(TileBitmap),
    Missing,
    Failed(TileError),
}

struct Completion {
    key: TileKey,
    generation: u64,
    outcome: Outcome,
}

struct InFlight {
    generation: u64,
    handle: AbortHandle,
}

/// Loads the tiles of the visible rectangle from a [`TileStreamProvider`].
///
/// Methods that start work must be called from within a tokio runtime.
pub struct TileLoader<P: TileStreamProvider + 'static> {
    provider: Arc<P>,
    pool: Arc<BitmapPool>,
    decoder: TileDecoder,
    tile_size: u32,

    visible: Option<VisibleTiles>,
    tiles: HashMap<TileKey, TileBitmap>,
    /// Tiles the provider had no data for, or that failed to decode
    missing: HashSet<TileKey>,
    in_flight: HashMap<TileKey, InFlight>,
    next_generation: u64,

    completed_tx: mpsc::UnboundedSender<Completion>,
    completed_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<P: TileStreamProvider + 'static> TileLoader<P> {
    /// Create a loader for tiles of `tile_size` pixels.
    pub fn new(provider: Arc<P>, pool: Arc<BitmapPool>, tile_size: u32) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            pool,
            decoder: TileDecoder::new(),
            tile_size,
            visible: None,
            tiles: HashMap::new(),
            missing: HashSet::new(),
            in_flight: HashMap::new(),
            next_generation: 0,
            completed_tx,
            completed_rx,
        }
    }

    /// Bring the loaded set in line with `visible`.
    ///
    /// Decoded tiles outside the rectangle are evicted, in-flight requests
    /// outside it are aborted, and requests are started for every on-map
    /// tile of the rectangle that is neither loaded, known missing, nor
    /// already requested.
    pub fn update(&mut self, visible: &VisibleTiles) {
        if let Some(previous) = self.visible {
            if previous.sub_sample != visible.sub_sample {
                // Decoded geometry changes with the sub-sample
                debug!(
                    from = previous.sub_sample,
                    to = visible.sub_sample,
                    "sub-sample changed, dropping decoded tiles"
                );
                self.invalidate();
            }
        }
        self.visible = Some(*visible);

        let evicted: Vec<TileKey> = self
            .tiles
            .keys()
            .filter(|key| !visible.contains(key))
            .copied()
            .collect();
        for key in &evicted {
            if let Some(bitmap) = self.tiles.remove(key) {
                self.recycle(bitmap);
            }
        }

        self.missing.retain(|key| visible.contains(key));

        let mut cancelled = 0usize;
        self.in_flight.retain(|key, flight| {
            if visible.contains(key) {
                true
            } else {
                flight.handle.abort();
                cancelled += 1;
                false
            }
        });

        let mut requested = 0usize;
        for key in visible.keys() {
            if self.tiles.contains_key(&key)
                || self.missing.contains(&key)
                || self.in_flight.contains_key(&key)
            {
                continue;
            }
            self.spawn(key, visible.sub_sample);
            requested += 1;
        }

        debug!(
            level = visible.level,
            evicted = evicted.len(),
            cancelled,
            requested,
            "visible tiles updated"
        );
    }

    /// Apply every completion that is already available, without waiting.
    ///
    /// Returns the number of completions processed.
    pub fn poll_completed(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.completed_rx.try_recv() {
            self.apply(completion);
            processed += 1;
        }
        processed
    }

    /// Wait until no request is in flight.
    pub async fn wait_idle(&mut self) {
        while !self.in_flight.is_empty() {
            match self.completed_rx.recv().await {
                Some(completion) => self.apply(completion),
                None => break,
            }
        }
    }

    /// Decoded bitmap of `key`, if loaded.
    pub fn tile(&self, key: &TileKey) -> Option<&TileBitmap> {
        self.tiles.get(key)
    }

    /// Whether `key` is visible but has no data.
    pub fn is_missing(&self, key: &TileKey) -> bool {
        self.missing.contains(key)
    }

    /// Keys of the decoded tiles, in no particular order.
    pub fn loaded_keys(&self) -> impl Iterator<Item = &TileKey> {
        self.tiles.keys()
    }

    pub fn loaded_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Rectangle passed to the last [`update`](Self::update).
    pub fn visible(&self) -> Option<&VisibleTiles> {
        self.visible.as_ref()
    }

    pub fn pool(&self) -> &Arc<BitmapPool> {
        &self.pool
    }

    fn spawn(&mut self, key: TileKey, sub_sample: u32) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let provider = Arc::clone(&self.provider);
        let pool = Arc::clone(&self.pool);
        let decoder = self.decoder.clone();
        let completed_tx = self.completed_tx.clone();

        let handle = tokio::spawn(fetch_and_decode(
            provider,
            pool,
            decoder,
            key,
            generation,
            sub_sample,
            completed_tx,
        ));

        self.in_flight.insert(
            key,
            InFlight {
                generation,
                handle: handle.abort_handle(),
            },
        );
    }

    fn apply(&mut self, completion: Completion) {
        let Completion {
            key,
            generation,
            outcome,
        } = completion;

        let live = matches!(self.in_flight.get(&key), Some(flight) if flight.generation == generation);
        if !live {
            trace!(tile = %key, generation, "discarding stale tile result");
            if let Outcome::Loaded(bitmap) = outcome {
                self.recycle(bitmap);
            }
            return;
        }
        self.in_flight.remove(&key);

        match outcome {
            Outcome::Loaded(bitmap) => {
                self.tiles.insert(key, bitmap);
            }
            Outcome::Missing => {
                debug!(tile = %key, "no data for tile");
                self.missing.insert(key);
            }
            Outcome::Failed(err) => {
                warn!(tile = %key, error = %err, "failed to load tile");
                self.missing.insert(key);
            }
        }
    }

    /// Return `bitmap` to the pool if it has the standard geometry.
    fn recycle(&self, bitmap: TileBitmap) {
        let sub_sample = self.visible.map_or(0, |v| v.sub_sample);
        let dimension = expected_dimension(self.tile_size, sub_sample);
        if bitmap.dimensions() == (dimension, dimension) {
            self.pool.release(bitmap);
        }
    }

    fn invalidate(&mut self) {
        for flight in self.in_flight.values() {
            flight.handle.abort();
        }
        self.in_flight.clear();
        self.tiles.clear();
        self.missing.clear();
        self.pool.clear();
    }
}

impl<P: TileStreamProvider + 'static> Drop for TileLoader<P> {
    fn drop(&mut self) {
        for flight in self.in_flight.values() {
            flight.handle.abort();
        }
    }
}

fn report(
    completed_tx: &mpsc::UnboundedSender<Completion>,
    key: TileKey,
    generation: u64,
    outcome: Outcome,
) {
    // The loader may have been dropped in the meantime
    let _ = completed_tx.send(Completion {
        key,
        generation,
        outcome,
    });
}

/// Fetch and decode `key`, sending the outcome to the loader.
///
/// The blocking decode reports its own result: aborting this task does not
/// stop it, and a bitmap decoded after the abort must still reach the loader
/// to be recycled.
async fn fetch_and_decode<P: TileStreamProvider>(
    provider: Arc<P>,
    pool: Arc<BitmapPool>,
    decoder: TileDecoder,
    key: TileKey,
    generation: u64,
    sub_sample: u32,
    completed_tx: mpsc::UnboundedSender<Completion>,
) {
    let Some(bytes) = provider.tile_stream(key.row, key.col, key.level).await else {
        report(&completed_tx, key, generation, Outcome::Missing);
        return;
    };

    let decode_tx = completed_tx.clone();
    let decoded = tokio::task::spawn_blocking(move || {
        let reuse = pool.acquire();
        let outcome = match decoder.decode(&bytes, sub_sample, reuse) {
            Ok(bitmap) => Outcome::Loaded(bitmap),
            Err(err) => Outcome::Failed(err),
        };
        report(&decode_tx, key, generation, outcome);
    })
    .await;

    if let Err(join_err) = decoded {
        report(
            &completed_tx,
            key,
            generation,
            Outcome::Failed(TileError::Task {
                message: join_err.to_string(),
            }),
        );
    }
}
