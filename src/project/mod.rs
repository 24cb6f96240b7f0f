// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Projects - the persisted aggregate of path classes and image entries

mod session;
mod store;

pub use session::ProjectSession;
pub use store::{CLASSES_FILE, DATA_DIR, PROJECT_EXTENSION, PROJECT_FILE};

use crate::classes::{PathClass, PathClassKey, PathClassRegistry};
use crate::config::Config;
use crate::engine::{ImageEngine, LocalImageEngine};
use crate::entry::{EntryId, ImageEntry, ImageType, THUMBNAIL_FILE};
use crate::error::{CatalogError, Result};
use crate::provider::{ImageProvider, LocalImageProvider};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use store::{
    ClassRecord, ClassesFile, EntryRecord, ImageData, ProjectDescriptor, ServerBuilder,
};
use tracing::{debug, info, warn};

/// Configures how a project is created or opened
pub struct ProjectBuilder {
    path: PathBuf,
    create: bool,
    engine: Option<Box<dyn ImageEngine>>,
    provider: Option<Box<dyn ImageProvider>>,
    config: Config,
}

impl ProjectBuilder {
    /// Allow creating a new project (the default) or require an existing one
    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Imaging engine used to validate images and render thumbnails
    #[must_use]
    pub fn engine(mut self, engine: impl ImageEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Path/URI translation for image locations
    #[must_use]
    pub fn provider(mut self, provider: impl ImageProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Thumbnail size and default image type
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Create or open the project
    pub fn open(self) -> Result<Project> {
        let (dir, file) = store::resolve_location(&self.path)?;
        let engine = self
            .engine
            .unwrap_or_else(|| Box::new(LocalImageEngine::new()));
        let provider = self
            .provider
            .unwrap_or_else(|| Box::new(LocalImageProvider));

        if file.is_file() {
            return Project::load(dir, file, engine, provider, self.config);
        }
        if !self.create {
            return Err(CatalogError::NotFound(format!(
                "no project file at {}",
                file.display()
            )));
        }
        Project::init(dir, file, engine, provider, self.config)
    }

    /// Open the project inside a session that saves when it ends
    pub fn session(self) -> Result<ProjectSession> {
        self.open().map(ProjectSession::new)
    }

    /// Run `f` against the project and save afterwards, whether `f`
    /// succeeded or not. An error from `f` takes precedence over a failed
    /// save, which is then only logged.
    pub fn with_session<T, E>(self, f: impl FnOnce(&mut Project) -> Result<T, E>) -> Result<T, E>
    where
        E: From<CatalogError>,
    {
        let mut project = self.open()?;
        let outcome = f(&mut project);
        let saved = project.save();
        match outcome {
            Ok(value) => {
                saved?;
                Ok(value)
            }
            Err(e) => {
                if let Err(save_err) = saved {
                    tracing::error!("Failed to save {} after error: {}", project.path.display(), save_err);
                }
                Err(e)
            }
        }
    }
}

/// A project catalog bound to a directory
pub struct Project {
    dir: PathBuf,
    path: PathBuf,
    uri: String,
    uri_previous: Option<String>,
    version: Option<String>,
    timestamp_creation: i64,
    timestamp_modification: i64,
    last_id: EntryId,
    classes: PathClassRegistry,
    path_classes: Vec<PathClassKey>,
    images: Vec<ImageEntry>,
    engine: Box<dyn ImageEngine>,
    provider: Box<dyn ImageProvider>,
    config: Config,
}

impl Project {
    /// Start configuring a project at `path` (a directory or a `.qpproj` file)
    pub fn builder(path: impl Into<PathBuf>) -> ProjectBuilder {
        ProjectBuilder {
            path: path.into(),
            create: true,
            engine: None,
            provider: None,
            config: Config::default(),
        }
    }

    /// Create a project, or open it if it already exists
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).open()
    }

    /// Open an existing project
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).create(false).open()
    }

    fn init(
        dir: PathBuf,
        file: PathBuf,
        engine: Box<dyn ImageEngine>,
        provider: Box<dyn ImageProvider>,
        config: Config,
    ) -> Result<Self> {
        if dir.exists() {
            if !dir.is_dir() {
                return Err(CatalogError::InvalidState {
                    path: dir,
                    reason: "not a directory".into(),
                });
            }
            if !store::holds_only_project_artifacts(&dir)? {
                return Err(CatalogError::InvalidState {
                    path: dir,
                    reason: "directory is not empty and holds no project".into(),
                });
            }
        }

        let dir = LocalImageProvider::absolute(&dir)?;
        let path = dir.join(file.file_name().unwrap_or(OsStr::new(PROJECT_FILE)));
        let uri = provider.uri_from_path(&path)?;
        let now = Utc::now().timestamp_millis();

        info!("Creating project at {}", dir.display());
        Ok(Self {
            dir,
            path,
            uri,
            uri_previous: None,
            version: None,
            timestamp_creation: now,
            timestamp_modification: now,
            last_id: 0,
            classes: PathClassRegistry::new(),
            path_classes: Vec::new(),
            images: Vec::new(),
            engine,
            provider,
            config,
        })
    }

    fn load(
        dir: PathBuf,
        file: PathBuf,
        engine: Box<dyn ImageEngine>,
        provider: Box<dyn ImageProvider>,
        config: Config,
    ) -> Result<Self> {
        let dir = LocalImageProvider::absolute(&dir)?;
        let path = LocalImageProvider::absolute(&file)?;
        let descriptor: ProjectDescriptor = store::read_json(&path)?;
        let uri = provider.uri_from_path(&path)?;

        let mut classes = PathClassRegistry::new();
        let mut path_classes = Vec::new();
        let classes_path = dir.join(CLASSES_FILE);
        if classes_path.is_file() {
            let stored: ClassesFile = store::read_json(&classes_path)?;
            for record in stored.path_classes {
                let key = classes.resolve_lineage(&record.names)?;
                classes.set_argb(key, store::i32_to_argb(record.color))?;
                if !path_classes.contains(&key) {
                    path_classes.push(key);
                }
            }
        }

        let mut images = Vec::with_capacity(descriptor.images.len());
        for record in descriptor.images {
            let mut entry = ImageEntry::new(
                record.entry_id,
                dir.join(DATA_DIR).join(record.entry_id.to_string()),
                record.server_builder.uri,
                record.image_name,
            );
            entry.set_description(record.description);
            *entry.metadata_mut() = record.metadata;

            let data_path = entry.data_path();
            if data_path.is_file() {
                let data: ImageData = store::read_json(&data_path)?;
                entry.set_image_type(data.image_type);
            }
            images.push(entry);
        }

        let last_id = images
            .iter()
            .map(ImageEntry::id)
            .fold(descriptor.last_id, EntryId::max);
        let uri_previous = (descriptor.uri != uri).then_some(descriptor.uri);
        if let Some(previous) = &uri_previous {
            info!("Project moved since last save (was {})", previous);
        }

        info!(
            "Opened project {} ({} classes, {} images)",
            path.display(),
            path_classes.len(),
            images.len()
        );
        Ok(Self {
            dir,
            path,
            uri,
            uri_previous,
            version: descriptor.version,
            timestamp_creation: descriptor.create_timestamp,
            timestamp_modification: descriptor.modify_timestamp,
            last_id,
            classes,
            path_classes,
            images,
            engine,
            provider,
            config,
        })
    }

    /// Write the whole catalog to the project directory
    pub fn save(&mut self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CatalogError::io(&self.dir, e))?;
        // Anchor the URI on the resolved directory now that it exists
        self.dir = LocalImageProvider::absolute(&self.dir)?;
        if let Some(file_name) = self.path.file_name() {
            self.path = self.dir.join(file_name);
        }
        self.uri = self.provider.uri_from_path(&self.path)?;

        let classes_path = self.dir.join(CLASSES_FILE);
        if let Some(parent) = classes_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }
        let classes = ClassesFile {
            path_classes: self
                .path_classes
                .iter()
                .map(|&key| -> Result<ClassRecord> {
                    Ok(ClassRecord {
                        names: self.classes.lineage(key)?,
                        color: store::argb_to_i32(self.classes.get(key)?.argb()),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        store::write_json(&classes_path, &classes)?;

        for entry in &self.images {
            fs::create_dir_all(entry.entry_path())
                .map_err(|e| CatalogError::io(entry.entry_path(), e))?;
            let data = ImageData {
                uri: entry.uri().to_string(),
                image_type: entry.image_type(),
            };
            store::write_json(&entry.data_path(), &data)?;
        }

        let version = self.engine.version();
        let modified = Utc::now()
            .timestamp_millis()
            .max(self.timestamp_modification + 1);
        let descriptor = ProjectDescriptor {
            version: Some(version.clone()),
            create_timestamp: self.timestamp_creation,
            modify_timestamp: modified,
            uri: self.uri.clone(),
            last_id: self.last_id,
            images: self
                .images
                .iter()
                .map(|entry| EntryRecord {
                    entry_id: entry.id(),
                    image_name: entry.image_name().to_string(),
                    description: entry.description().map(String::from),
                    metadata: entry.metadata().clone(),
                    server_builder: ServerBuilder {
                        uri: entry.uri().to_string(),
                    },
                })
                .collect(),
        };
        store::write_json(&self.path, &descriptor)?;

        self.version = Some(version);
        self.timestamp_modification = modified;
        self.uri_previous = None;
        info!("Saved project {}", self.path.display());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Identity and metadata
    // -------------------------------------------------------------------------

    /// Descriptor file location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Project name, taken from the directory name
    #[must_use]
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Engine version that last saved the project
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Creation time, milliseconds since the Unix epoch
    #[must_use]
    pub fn timestamp_creation(&self) -> i64 {
        self.timestamp_creation
    }

    /// Last modification time, milliseconds since the Unix epoch
    #[must_use]
    pub fn timestamp_modification(&self) -> i64 {
        self.timestamp_modification
    }

    /// URI of the descriptor file
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// URI recorded at the last save, when the project has moved since
    #[must_use]
    pub fn uri_previous(&self) -> Option<&str> {
        self.uri_previous.as_deref()
    }

    /// The engine this project validates images with
    #[must_use]
    pub fn engine(&self) -> &dyn ImageEngine {
        self.engine.as_ref()
    }

    // -------------------------------------------------------------------------
    // Path classes
    // -------------------------------------------------------------------------

    /// Registry that owns every class this project refers to
    #[must_use]
    pub fn registry(&self) -> &PathClassRegistry {
        &self.classes
    }

    /// Mutable registry, for creating classes and changing colors
    pub fn registry_mut(&mut self) -> &mut PathClassRegistry {
        &mut self.classes
    }

    /// The project's classes, in order
    pub fn path_classes(&self) -> impl Iterator<Item = PathClass<'_>> + '_ {
        self.path_classes
            .iter()
            .filter_map(|&key| self.classes.get(key).ok())
    }

    /// Keys of the project's classes, in order
    #[must_use]
    pub fn path_class_keys(&self) -> &[PathClassKey] {
        &self.path_classes
    }

    /// Replace the project's classes; duplicates keep their first position
    pub fn set_path_classes(&mut self, keys: impl IntoIterator<Item = PathClassKey>) -> Result<()> {
        let mut ordered = Vec::new();
        for key in keys {
            self.classes.get(key)?;
            if !ordered.contains(&key) {
                ordered.push(key);
            }
        }
        debug!("Setting {} path classes", ordered.len());
        self.path_classes = ordered;
        Ok(())
    }

    /// Append a class unless it is already listed; returns whether it was added
    pub fn add_path_class(&mut self, key: PathClassKey) -> Result<bool> {
        self.classes.get(key)?;
        if self.path_classes.contains(&key) {
            return Ok(false);
        }
        self.path_classes.push(key);
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Image entries
    // -------------------------------------------------------------------------

    /// All entries, in insertion order
    #[must_use]
    pub fn images(&self) -> &[ImageEntry] {
        &self.images
    }

    /// Mutable entries, for changing types, names and metadata
    pub fn images_mut(&mut self) -> &mut [ImageEntry] {
        &mut self.images
    }

    /// Entry by id
    #[must_use]
    pub fn image(&self, id: EntryId) -> Option<&ImageEntry> {
        self.images.iter().find(|e| e.id() == id)
    }

    /// Mutable entry by id
    pub fn image_mut(&mut self, id: EntryId) -> Option<&mut ImageEntry> {
        self.images.iter_mut().find(|e| e.id() == id)
    }

    /// Add the image at `path`.
    ///
    /// Validates the image with the engine, allocates a slot and writes its
    /// thumbnail. On failure the project is left unchanged. The project is
    /// not saved.
    pub fn add_image(
        &mut self,
        path: impl AsRef<Path>,
        image_type: Option<ImageType>,
    ) -> Result<&mut ImageEntry> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::NotFound(path.display().to_string()));
        }
        let uri = self.provider.uri_from_path(path)?;
        let image_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| uri.clone());
        self.register_image(uri, image_name, image_type)
    }

    /// Add the image at `uri`; see [`Project::add_image`]
    pub fn add_image_uri(
        &mut self,
        uri: &str,
        image_type: Option<ImageType>,
    ) -> Result<&mut ImageEntry> {
        let path = self.provider.path_from_uri(uri)?;
        self.add_image(path, image_type)
    }

    fn register_image(
        &mut self,
        uri: String,
        image_name: String,
        image_type: Option<ImageType>,
    ) -> Result<&mut ImageEntry> {
        let info = self.engine.open_image(&uri)?;

        let id = self.last_id + 1;
        let entry_path = self.dir.join(DATA_DIR).join(id.to_string());
        fs::create_dir_all(&entry_path).map_err(|e| CatalogError::io(&entry_path, e))?;
        let thumbnail = entry_path.join(THUMBNAIL_FILE);
        if let Err(e) = self
            .engine
            .write_thumbnail(&uri, &thumbnail, self.config.thumbnail_size)
        {
            if let Err(cleanup) = fs::remove_dir_all(&entry_path) {
                warn!("Failed to remove slot {}: {}", entry_path.display(), cleanup);
            }
            // Only succeeds when no other slot exists
            let _ = fs::remove_dir(self.dir.join(DATA_DIR));
            return Err(e.into());
        }

        self.last_id = id;
        let mut entry = ImageEntry::new(id, entry_path, uri, image_name);
        entry.set_image_type(image_type.unwrap_or(self.config.default_image_type));
        info!(
            "Added image {} as entry {} ({}x{} {})",
            entry.uri(),
            id,
            info.width,
            info.height,
            info.format
        );

        let index = self.images.len();
        self.images.push(entry);
        Ok(&mut self.images[index])
    }

    /// Remove an entry, optionally deleting its slot directory
    pub fn remove_image(&mut self, id: EntryId, remove_data: bool) -> Result<ImageEntry> {
        let index = self
            .images
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| CatalogError::NotFound(format!("image entry {id}")))?;
        if remove_data && self.images[index].entry_path().exists() {
            let slot = self.images[index].entry_path();
            fs::remove_dir_all(slot).map_err(|e| CatalogError::io(slot, e))?;
        }
        info!("Removed image entry {}", id);
        Ok(self.images.remove(index))
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    /// Readability of every entry, keyed by entry id
    #[must_use]
    pub fn is_readable(&self) -> BTreeMap<EntryId, bool> {
        self.images
            .iter()
            .map(|entry| (entry.id(), entry.is_readable(self.engine.as_ref())))
            .collect()
    }

    /// Readability of one entry; unknown ids are not readable
    #[must_use]
    pub fn is_entry_readable(&self, id: EntryId) -> bool {
        self.image(id)
            .is_some_and(|entry| entry.is_readable(self.engine.as_ref()))
    }

    /// Rewrite entry URIs found in `mapping` (old URI to new URI).
    ///
    /// Returns the number of entries rewritten.
    pub fn update_image_paths(&mut self, mapping: &HashMap<String, String>) -> usize {
        self.update_image_paths_with(|uri| mapping.get(uri).cloned())
    }

    /// Rewrite entry URIs with `resolver`; entries it returns `None` for are
    /// left untouched. Each rewritten entry is re-checked with the engine.
    pub fn update_image_paths_with(&mut self, resolver: impl Fn(&str) -> Option<String>) -> usize {
        let mut updated = 0;
        for entry in &mut self.images {
            let Some(new_uri) = resolver(entry.uri()) else {
                continue;
            };
            if new_uri == entry.uri() {
                continue;
            }
            info!("Relinking entry {}: {} -> {}", entry.id(), entry.uri(), new_uri);
            entry.set_uri(new_uri);
            if !entry.is_readable(self.engine.as_ref()) {
                warn!("Entry {} is still unreadable at {}", entry.id(), entry.uri());
            }
            updated += 1;
        }
        updated
    }

    /// After the project directory moved, re-point unreadable entries that
    /// lived under the old directory to the same place under the new one.
    ///
    /// Only candidates the engine can open are applied. Returns the number of
    /// entries rewritten; zero when the project has not moved.
    pub fn rebase_moved_images(&mut self) -> Result<usize> {
        let Some(previous) = self.uri_previous.clone() else {
            return Ok(0);
        };
        let previous_file = self.provider.path_from_uri(&previous)?;
        let Some(previous_dir) = previous_file.parent() else {
            return Ok(0);
        };

        let engine = self.engine.as_ref();
        let mut mapping = HashMap::new();
        for entry in &self.images {
            if entry.is_readable(engine) {
                continue;
            }
            let Some(candidate) = self.provider.rebase(entry.uri(), previous_dir, &self.dir) else {
                continue;
            };
            if engine.open_image(&candidate).is_ok() {
                mapping.insert(entry.uri().to_string(), candidate);
            }
        }
        debug!("Rebasing {} moved images", mapping.len());
        Ok(self.update_image_paths(&mapping))
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("path", &self.path)
            .field("uri", &self.uri)
            .field("uri_previous", &self.uri_previous)
            .field("version", &self.version)
            .field("path_classes", &self.path_classes.len())
            .field("images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Project '{}' {}>", self.name(), self.path.display())
    }
}
