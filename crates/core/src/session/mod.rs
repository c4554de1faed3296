use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{MediaConfig, MediaError, Picture, Result, Sound};

/// Per-session state shared by the file helpers: where relative media names
/// are looked up, and which file was used last.
#[derive(Debug, Clone)]
pub struct MediaSession {
    config: MediaConfig,
    last_file: Option<PathBuf>,
    remember_last_path: bool,
}

impl Default for MediaSession {
    fn default() -> Self {
        Self::new(MediaConfig::default())
    }
}

impl MediaSession {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            config,
            last_file: None,
            remember_last_path: true,
        }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn media_folder(&self) -> Option<&Path> {
        self.config.media_folder.as_deref()
    }

    pub fn set_media_folder(&mut self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        debug!(folder = %folder.display(), "media folder set");
        self.config.media_folder = Some(folder);
    }

    /// Goes back to resolving relative names against the working directory.
    pub fn unset_media_folder(&mut self) {
        self.config.media_folder = None;
    }

    pub fn remember_last_path(&mut self, remember: bool) {
        self.remember_last_path = remember;
        if !remember {
            self.last_file = None;
        }
    }

    /// Most recently loaded or written file, if remembering is enabled.
    pub fn last_file(&self) -> Option<&Path> {
        self.last_file.as_deref()
    }

    /// Absolute paths pass through; relative ones are joined to the media
    /// folder when one is set.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        match self.media_folder() {
            Some(folder) if name.is_relative() => folder.join(name),
            _ => name.to_path_buf(),
        }
    }

    fn existing(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.resolve(name);
        if !path.is_file() {
            return Err(MediaError::MissingFile(path));
        }
        Ok(path)
    }

    fn note(&mut self, path: &Path) {
        if self.remember_last_path {
            self.last_file = Some(path.to_path_buf());
        }
    }

    pub fn make_sound(&mut self, name: impl AsRef<Path>) -> Result<Sound> {
        let path = self.existing(name)?;
        let sound = Sound::from_wav_file(&path)?;
        self.note(&path);
        Ok(sound)
    }

    pub fn make_picture(&mut self, name: impl AsRef<Path>) -> Result<Picture> {
        let path = self.existing(name)?;
        let picture = Picture::open(&path)?;
        self.note(&path);
        Ok(picture)
    }

    /// Silent sound using the session's sound defaults.
    pub fn make_empty_sound(&self, num_samples: usize) -> Result<Sound> {
        let sound = &self.config.sound;
        Sound::empty_with_config(num_samples, sound.sample_rate, sound)
    }

    /// Picture filled with the session's background colour.
    pub fn make_empty_picture(&self, width: usize, height: usize) -> Result<Picture> {
        let picture = &self.config.picture;
        Picture::empty_with_config(width, height, picture.background, picture)
    }

    pub fn write_sound_to(&mut self, sound: &Sound, name: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.resolve(name);
        sound.write_wav_file(&path)?;
        self.note(&path);
        Ok(path)
    }

    pub fn write_picture_to(&mut self, picture: &Picture, name: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.resolve(name);
        picture.save(&path)?;
        self.note(&path);
        Ok(path)
    }
}
