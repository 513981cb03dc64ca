//! The sorting loop, expressed as a key-event state machine.
//!
//! A [`Session`] holds the image currently on display and turns each key
//! event into an [`Action`]. It knows nothing about how keys are captured
//! or how images are drawn, so any front end can drive it.

use crate::config::InstanceConfig;
use crate::sieve::{Operation, Sieve, SieveOutcome, SieveResult};
use crate::source::SourceImage;
use std::path::PathBuf;

/// Input event delivered by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable key. Letters are matched case-insensitively.
    Char(char),
    /// The user asked to leave the session.
    Quit,
}

/// What a key event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The file was sorted and the next image is on display.
    Sorted(Operation),
    /// The file was sorted and no images remain.
    Finished(Operation),
    /// The destination name was taken and kept; the same image stays up.
    Kept { source: PathBuf, existing: PathBuf },
    /// The key is not bound, or nothing is on display.
    Ignored,
    /// The user quit before the images ran out.
    Quit,
}

/// One pass over the source images.
pub struct Session<'a, I>
where
    I: Iterator<Item = SourceImage>,
{
    config: &'a InstanceConfig,
    images: I,
    current: Option<SourceImage>,
    operations: Vec<Operation>,
}

impl<'a, I> Session<'a, I>
where
    I: Iterator<Item = SourceImage>,
{
    /// Starts the session and pulls the first image.
    pub fn new(config: &'a InstanceConfig, mut images: I) -> Self {
        let current = images.next();
        Self {
            config,
            images,
            current,
            operations: Vec::new(),
        }
    }

    pub fn config(&self) -> &InstanceConfig {
        self.config
    }

    /// The image on display, if any remain.
    pub fn current(&self) -> Option<&SourceImage> {
        self.current.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// Upper bound of images still queued after the current one.
    pub fn remaining(&self) -> usize {
        let (lower, upper) = self.images.size_hint();
        upper.unwrap_or(lower)
    }

    /// Operations performed so far, oldest first.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Handles one key event. Runs to completion before returning.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::sieve::SieveError`] from the sort action,
    /// including the deliberate halt on a duplicate name.
    pub fn on_key(&mut self, key: Key) -> SieveResult<Action> {
        let key = match key {
            Key::Quit => return Ok(Action::Quit),
            Key::Char(c) => c.to_ascii_lowercase(),
        };

        if self.config.destination(key).is_none() {
            return Ok(Action::Ignored);
        }

        let Some(current) = &self.current else {
            return Ok(Action::Ignored);
        };

        match Sieve::new(self.config).apply(&current.path, key)? {
            SieveOutcome::Sorted(operation) => {
                self.operations.push(operation.clone());
                self.current = self.images.next();
                if self.current.is_some() {
                    Ok(Action::Sorted(operation))
                } else {
                    Ok(Action::Finished(operation))
                }
            }
            SieveOutcome::Kept { source, existing } => Ok(Action::Kept { source, existing }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Binding, DisplaySize, DuplicateMode, SieveMode};
    use crate::sieve::SieveError;
    use image::DynamicImage;
    use std::fs;
    use tempfile::TempDir;

    struct Setup {
        _temp_dir: TempDir,
        config: InstanceConfig,
        files: Vec<PathBuf>,
    }

    fn setup(names: &[&str], mode: SieveMode, duplicates: DuplicateMode) -> Setup {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("source");
        let keep = temp_dir.path().join("keep");
        let trash = temp_dir.path().join("trash");
        for dir in [&source, &keep, &trash] {
            fs::create_dir(dir).expect("Failed to create directory");
        }
        let files = names
            .iter()
            .map(|name| {
                let path = source.join(name);
                fs::write(&path, name.as_bytes()).expect("Failed to write file");
                path
            })
            .collect();
        let config = InstanceConfig::new(
            source,
            vec![
                Binding::new("k", keep).unwrap(),
                Binding::new("t", trash).unwrap(),
            ],
            mode,
            duplicates,
            DisplaySize::default(),
        );
        Setup {
            _temp_dir: temp_dir,
            config,
            files,
        }
    }

    fn images(files: &[PathBuf]) -> impl Iterator<Item = SourceImage> + '_ {
        files.iter().map(|path| SourceImage {
            preview: DynamicImage::new_rgb8(1, 1),
            path: path.clone(),
        })
    }

    fn dest(setup: &Setup, key: char, name: &str) -> PathBuf {
        setup.config.destination(key).unwrap().join(name)
    }

    #[test]
    fn test_sorts_and_advances() {
        let setup = setup(&["one.jpg", "two.jpg"], SieveMode::Move, DuplicateMode::Maintain);
        let mut session = Session::new(&setup.config, images(&setup.files));

        let action = session.on_key(Key::Char('k')).unwrap();

        assert!(matches!(action, Action::Sorted(_)));
        assert_eq!(session.current().unwrap().path, setup.files[1]);
        assert!(dest(&setup, 'k', "one.jpg").exists());
        assert!(!setup.files[0].exists());
    }

    #[test]
    fn test_last_file_finishes_session() {
        let setup = setup(&["only.jpg"], SieveMode::Copy, DuplicateMode::Maintain);
        let mut session = Session::new(&setup.config, images(&setup.files));

        let action = session.on_key(Key::Char('t')).unwrap();

        assert!(matches!(action, Action::Finished(ref op) if op.key == 't'));
        assert!(session.is_finished());
        assert_eq!(session.operations().len(), 1);
    }

    #[test]
    fn test_uppercase_key_matches_binding() {
        let setup = setup(&["one.jpg"], SieveMode::Copy, DuplicateMode::Maintain);
        let mut session = Session::new(&setup.config, images(&setup.files));

        let action = session.on_key(Key::Char('K')).unwrap();

        assert!(matches!(action, Action::Finished(_)));
        assert!(dest(&setup, 'k', "one.jpg").exists());
    }

    #[test]
    fn test_unbound_key_is_ignored() {
        let setup = setup(&["one.jpg"], SieveMode::Move, DuplicateMode::Maintain);
        let mut session = Session::new(&setup.config, images(&setup.files));

        assert_eq!(session.on_key(Key::Char('x')).unwrap(), Action::Ignored);
        assert_eq!(session.current().unwrap().path, setup.files[0]);
        assert!(setup.files[0].exists());
    }

    #[test]
    fn test_quit() {
        let setup = setup(&["one.jpg"], SieveMode::Move, DuplicateMode::Maintain);
        let mut session = Session::new(&setup.config, images(&setup.files));

        assert_eq!(session.on_key(Key::Quit).unwrap(), Action::Quit);
        assert!(session.operations().is_empty());
    }

    #[test]
    fn test_kept_duplicate_does_not_advance() {
        let setup = setup(&["one.jpg", "two.jpg"], SieveMode::Move, DuplicateMode::Maintain);
        fs::write(dest(&setup, 'k', "one.jpg"), b"older").expect("Failed to write file");
        let mut session = Session::new(&setup.config, images(&setup.files));

        let action = session.on_key(Key::Char('k')).unwrap();

        assert!(matches!(action, Action::Kept { .. }));
        assert_eq!(session.current().unwrap().path, setup.files[0]);

        // A different destination still accepts the same file.
        let action = session.on_key(Key::Char('t')).unwrap();
        assert!(matches!(action, Action::Sorted(_)));
        assert!(dest(&setup, 't', "one.jpg").exists());
    }

    #[test]
    fn test_halt_propagates() {
        let setup = setup(&["one.jpg"], SieveMode::Copy, DuplicateMode::Halt);
        fs::write(dest(&setup, 'k', "one.jpg"), b"older").expect("Failed to write file");
        let mut session = Session::new(&setup.config, images(&setup.files));

        let result = session.on_key(Key::Char('k'));

        assert!(matches!(result, Err(SieveError::DuplicateHalt { .. })));
    }

    #[test]
    fn test_empty_session_is_finished() {
        let setup = setup(&[], SieveMode::Copy, DuplicateMode::Maintain);
        let mut session = Session::new(&setup.config, images(&setup.files));

        assert!(session.is_finished());
        assert_eq!(session.remaining(), 0);
        assert_eq!(session.on_key(Key::Char('k')).unwrap(), Action::Ignored);
        assert!(!dest(&setup, 'k', "anything").exists());
    }
}
