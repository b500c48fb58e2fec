/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The photo-cycling tick: list → pick → publish → notify.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::property::PropertyCell;
use crate::publisher::ArtifactPublisher;
use crate::source::{self, PhotoSource};

use super::{CycleJob, TickError, TickOutcome};

/// [`CycleJob`] that republishes a randomly chosen photo on every tick.
///
/// Selection uses an explicitly supplied [`StdRng`], so a fixed seed gives a
/// reproducible sequence for a fixed directory listing.
pub struct PhotoRotation {
    source: Box<dyn PhotoSource>,
    publisher: ArtifactPublisher,
    rng: Mutex<StdRng>,
    /// Read-only `null` property bumped after every successful publish.
    image: Arc<PropertyCell<()>>,
}

impl PhotoRotation {
    pub fn new(
        source: impl PhotoSource + 'static,
        publisher: ArtifactPublisher,
        rng: StdRng,
        image: Arc<PropertyCell<()>>,
    ) -> Self {
        Self {
            source: Box::new(source),
            publisher,
            rng: Mutex::new(rng),
            image,
        }
    }

    pub fn publisher(&self) -> &ArtifactPublisher {
        &self.publisher
    }
}

impl CycleJob for PhotoRotation {
    fn tick(&self) -> Result<TickOutcome, TickError> {
        let candidates = source::candidates(self.source.as_ref()).map_err(TickError::ListFailed)?;

        let choice = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            candidates.choose(&mut *rng)
        }
        .ok_or(TickError::EmptyCandidateSet)?;

        self.publisher.publish(&choice.path)?;
        self.image.update(());

        Ok(TickOutcome::Published {
            name: choice.name.clone(),
            path: choice.path.clone(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycler::{CycleScheduler, SchedulerState};
    use crate::property::{PropertyMetadata, PropertyObserver};
    use crate::publisher::PublishError;
    use crate::source::{DirectorySource, SourceEntry};
    use rand::SeedableRng;
    use serde_json::Value;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    // ── Test helpers ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct ChangeCounter(AtomicUsize);

    impl PropertyObserver for ChangeCounter {
        fn property_changed(&self, _name: &str, _value: Value) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ChangeCounter {
        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Lists one photo that is never actually on disk, as if it were deleted
    /// between listing and publishing.
    #[derive(Default)]
    struct VanishingSource {
        listings: Arc<AtomicUsize>,
    }

    impl PhotoSource for VanishingSource {
        fn list_files(&self) -> io::Result<Vec<SourceEntry>> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SourceEntry {
                name: "ghost.jpg".to_string(),
                path: PathBuf::from("/nonexistent/photos/ghost.jpg"),
                is_file: true,
            }])
        }
    }

    fn image_cell(counter: &Arc<ChangeCounter>) -> Arc<PropertyCell<()>> {
        let meta = PropertyMetadata {
            name: "image".to_string(),
            read_only: true,
            ..Default::default()
        };
        Arc::new(PropertyCell::new(meta, ()).with_observer(counter.clone()))
    }

    fn photo_dir(names: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        dir
    }

    fn rotation(photos: &Path, public: &Path, seed: u64) -> (PhotoRotation, Arc<ChangeCounter>) {
        let counter = Arc::new(ChangeCounter::default());
        let rotation = PhotoRotation::new(
            DirectorySource::new(photos),
            ArtifactPublisher::new(public),
            StdRng::seed_from_u64(seed),
            image_cell(&counter),
        );
        (rotation, counter)
    }

    fn published_name(rotation: &PhotoRotation) -> String {
        fs::read_to_string(rotation.publisher().current_path()).unwrap()
    }

    // ── tick ──────────────────────────────────────────────────────────────────

    #[test]
    fn tick_publishes_an_eligible_photo_and_notifies() {
        let photos = photo_dir(&["a.jpg", "b.JPEG", "readme.txt"]);
        let public = tempfile::tempdir().unwrap();
        let (rotation, counter) = rotation(photos.path(), public.path(), 7);

        for _ in 0..50 {
            let TickOutcome::Published { name, .. } = rotation.tick().unwrap();
            assert!(name == "a.jpg" || name == "b.JPEG", "picked {name}");
            assert_eq!(published_name(&rotation), name);
        }
        assert_eq!(counter.get(), 50);
    }

    #[test]
    fn both_candidates_get_picked_eventually() {
        let photos = photo_dir(&["a.jpg", "b.jpg"]);
        let public = tempfile::tempdir().unwrap();
        let (rotation, _counter) = rotation(photos.path(), public.path(), 1);

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..64 {
            let TickOutcome::Published { name, .. } = rotation.tick().unwrap();
            seen.insert(name);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let photos = photo_dir(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
        let public_1 = tempfile::tempdir().unwrap();
        let public_2 = tempfile::tempdir().unwrap();
        let (first, _) = rotation(photos.path(), public_1.path(), 42);
        let (second, _) = rotation(photos.path(), public_2.path(), 42);

        let picks = |r: &PhotoRotation| -> Vec<String> {
            (0..20)
                .map(|_| match r.tick().unwrap() {
                    TickOutcome::Published { name, .. } => name,
                })
                .collect()
        };

        assert_eq!(picks(&first), picks(&second));
    }

    #[test]
    fn empty_directory_keeps_previous_artifact() {
        let photos = photo_dir(&["a.jpg"]);
        let public = tempfile::tempdir().unwrap();
        let (rotation, counter) = rotation(photos.path(), public.path(), 3);
        rotation.tick().unwrap();

        fs::remove_file(photos.path().join("a.jpg")).unwrap();
        fs::write(photos.path().join("notes.txt"), b"not a photo").unwrap();

        assert!(matches!(rotation.tick(), Err(TickError::EmptyCandidateSet)));
        assert_eq!(counter.get(), 1, "no notification for a skipped tick");
        assert!(rotation.publisher().current_path().symlink_metadata().is_ok());
    }

    #[test]
    fn missing_source_directory_is_list_failure() {
        let public = tempfile::tempdir().unwrap();
        let (rotation, _) = rotation(Path::new("/nonexistent/photos"), public.path(), 0);

        assert!(matches!(rotation.tick(), Err(TickError::ListFailed(_))));
    }

    #[test]
    fn vanished_candidate_is_publish_failure_without_notification() {
        let public = tempfile::tempdir().unwrap();
        let counter = Arc::new(ChangeCounter::default());
        let rotation = PhotoRotation::new(
            VanishingSource::default(),
            ArtifactPublisher::new(public.path()),
            StdRng::seed_from_u64(0),
            image_cell(&counter),
        );

        let err = rotation.tick().unwrap_err();

        assert!(matches!(
            err,
            TickError::Publish(PublishError::SourceMissing { .. })
        ));
        assert_eq!(counter.get(), 0);
        assert!(!rotation.publisher().current_path().exists());
    }

    // ── under the scheduler ───────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn scheduler_keeps_firing_after_publish_failures() {
        let public = tempfile::tempdir().unwrap();
        let counter = Arc::new(ChangeCounter::default());
        let source = VanishingSource::default();
        let listings = Arc::clone(&source.listings);
        let rotation = PhotoRotation::new(
            source,
            ArtifactPublisher::new(public.path()),
            StdRng::seed_from_u64(0),
            image_cell(&counter),
        );
        let sched = CycleScheduler::new(Arc::new(rotation)).unwrap();
        sched.start(Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(listings.load(Ordering::SeqCst), 3);
        assert_eq!(sched.state(), SchedulerState::Armed(Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_set_tick_stays_armed() {
        let photos = photo_dir(&[]);
        let public = tempfile::tempdir().unwrap();
        let (rotation, counter) = rotation(photos.path(), public.path(), 0);
        let sched = CycleScheduler::new(Arc::new(rotation)).unwrap();
        sched.start(Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(counter.get(), 0);

        // A photo appearing later is picked up on the next tick.
        fs::write(photos.path().join("late.jpg"), b"late.jpg").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(counter.get(), 1);
        assert_eq!(
            fs::read_to_string(public.path().join("current.jpg")).unwrap(),
            "late.jpg"
        );
    }
}
