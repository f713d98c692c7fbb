use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use toygit_index::{
    check_entry, load, FileState, Index, IndexEntry, IndexError, LockedIndex, WorkdirStatus,
};
use toygit_object::{blob_from_bytes, commit_from_fields, Signature};
use toygit_store::{LooseObjectStore, ObjectStore, ZstdCompressor};
use toygit_types::ObjectId;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};
use crate::inspect::{InspectMode, Inspection};
use crate::layout::{Layout, META_DIR};
use crate::refs::{self, HeadRef};
use crate::stage::{StageReport, StagedFile};

/// An open repository: a work tree plus its `.toygit` directory.
#[derive(Debug)]
pub struct Repository {
    layout: Layout,
    config: RepoConfig,
    store: LooseObjectStore,
}

impl Repository {
    /// Create the metadata directory under `path` and open it.
    ///
    /// With `force`, an existing repository is repaired in place: missing
    /// directories, `HEAD` and `config` are recreated while objects, the
    /// index and any existing `HEAD` or `config` are kept.
    pub fn init(path: impl AsRef<Path>, force: bool) -> RepoResult<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| RepoError::at(path, e))?;
        if !meta.is_dir() {
            return Err(RepoError::NotADirectory(path.to_path_buf()));
        }
        let work_tree = path.canonicalize().map_err(|e| RepoError::at(path, e))?;
        let layout = Layout::new(work_tree);

        let reinit = layout.meta_dir().exists();
        if reinit && !force {
            return Err(RepoError::AlreadyInitialized(layout.meta_dir().to_path_buf()));
        }

        for dir in [layout.objects_dir(), layout.heads_dir(), layout.tags_dir()] {
            fs::create_dir_all(&dir).map_err(|e| RepoError::at(&dir, e))?;
        }

        let config_path = layout.config_path();
        let config = if config_path.exists() {
            RepoConfig::load(&config_path)?
        } else {
            let config = RepoConfig::default();
            config.save(&config_path)?;
            config
        };
        if !layout.head_path().exists() {
            refs::write_head(&layout, &HeadRef::branch(&config.core.default_branch))?;
        }

        info!(
            path = %layout.meta_dir().display(),
            reinit,
            "initialized repository"
        );
        Self::from_parts(layout, config)
    }

    /// Open the repository whose work tree is exactly `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let work_tree = path.canonicalize().map_err(|e| RepoError::at(path, e))?;
        let layout = Layout::new(work_tree);
        if !layout.meta_dir().is_dir() {
            return Err(RepoError::NotARepository(path.to_path_buf()));
        }
        let config = RepoConfig::load(&layout.config_path())?;
        Self::from_parts(layout, config)
    }

    /// Open the repository containing `start`, searching parent directories.
    pub fn discover(start: impl AsRef<Path>) -> RepoResult<Self> {
        let start = start.as_ref();
        let canonical = start.canonicalize().map_err(|e| RepoError::at(start, e))?;
        canonical
            .ancestors()
            .find(|dir| dir.join(META_DIR).is_dir())
            .ok_or_else(|| RepoError::NotARepository(start.to_path_buf()))
            .and_then(Self::open)
    }

    fn from_parts(layout: Layout, config: RepoConfig) -> RepoResult<Self> {
        config.validate()?;
        let store = LooseObjectStore::new(layout.objects_dir())
            .with_compressor(ZstdCompressor::new(config.core.compression_level))
            .with_min_prefix_len(config.core.min_abbrev_len);
        Ok(Self {
            layout,
            config,
            store,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn work_tree(&self) -> &Path {
        self.layout.work_tree()
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn store(&self) -> &LooseObjectStore {
        &self.store
    }

    /// Snapshot of the index as currently saved.
    pub fn index(&self) -> RepoResult<Index> {
        Ok(load(&self.layout.index_path())?)
    }

    // ---- Staging ----

    /// Store the content of `paths` as blobs and record them in the index.
    ///
    /// Relative paths resolve against the work tree. Directories are walked
    /// recursively. Failures are collected per path and the rest of the batch
    /// still runs; the index lock is held for the whole batch.
    ///
    /// # Errors
    ///
    /// Only whole-batch failures: the index cannot be locked, loaded or saved.
    pub fn stage<P: AsRef<Path>>(&self, paths: &[P]) -> RepoResult<StageReport> {
        let mut locked =
            LockedIndex::open(&self.layout.index_path(), &self.config.lock_config())?;
        let mut report = StageReport::default();

        for path in paths {
            let path = self.layout.work_tree().join(path.as_ref());
            if let Err(err) = self.stage_path(locked.index_mut(), &path, &mut report) {
                warn!(path = %path.display(), error = %err, "failed to stage");
                report.fail(path, err);
            }
        }

        if !report.staged.is_empty() {
            locked.save()?;
        }
        debug!(
            staged = report.staged.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "staging finished"
        );
        Ok(report)
    }

    fn stage_path(
        &self,
        index: &mut Index,
        path: &Path,
        report: &mut StageReport,
    ) -> RepoResult<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| RepoError::at(path, e))?;
        if meta.file_type().is_symlink() {
            warn!(path = %path.display(), "skipping symbolic link");
            report.skip(path, "symbolic link");
            return Ok(());
        }
        let path = path.canonicalize().map_err(|e| RepoError::at(path, e))?;
        self.relative(&path)?;

        if meta.is_file() {
            return self.stage_file(index, &path, report);
        }
        if !meta.is_dir() {
            report.skip(path, "not a regular file");
            return Ok(());
        }

        let walker = WalkDir::new(&path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != OsStr::new(META_DIR));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let at = err.path().map_or_else(|| path.clone(), Path::to_path_buf);
                    report.fail(at.clone(), RepoError::at(&at, io::Error::from(err)));
                    continue;
                }
            };
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                warn!(path = %entry.path().display(), "skipping symbolic link");
                report.skip(entry.path(), "symbolic link");
            } else if !file_type.is_file() {
                report.skip(entry.path(), "not a regular file");
            } else if let Err(err) = self.stage_file(index, entry.path(), report) {
                warn!(path = %entry.path().display(), error = %err, "failed to stage");
                report.fail(entry.path(), err);
            }
        }
        Ok(())
    }

    fn stage_file(
        &self,
        index: &mut Index,
        file: &Path,
        report: &mut StageReport,
    ) -> RepoResult<()> {
        let rel = self.relative(file)?;
        // Stat before reading so a concurrent edit leaves a stale stamp.
        let meta = fs::symlink_metadata(file).map_err(|e| RepoError::at(file, e))?;
        let data = fs::read(file).map_err(|e| RepoError::at(file, e))?;
        let object_id = self.store.write(&blob_from_bytes(data))?;
        let evicted = index.upsert(IndexEntry::from_metadata(rel.clone(), object_id, &meta))?;
        debug!(path = %rel, id = %object_id.short_hex(), "staged");
        report.staged.push(StagedFile {
            path: rel,
            object_id,
            evicted,
        });
        Ok(())
    }

    /// Remove `paths` from the index. A directory removes everything under
    /// it and the work tree itself clears the index.
    ///
    /// Nothing is saved if any path matches no entry.
    pub fn unstage<P: AsRef<Path>>(&self, paths: &[P]) -> RepoResult<Vec<String>> {
        let mut locked =
            LockedIndex::open(&self.layout.index_path(), &self.config.lock_config())?;
        let mut removed = Vec::new();

        for path in paths {
            let rel = self.lexical_relative(path.as_ref())?;
            let index = locked.index_mut();
            if rel.is_empty() {
                let all: Vec<String> = index.iter().map(|e| e.path.clone()).collect();
                if all.is_empty() {
                    return Err(RepoError::PathNotFound(path.as_ref().to_path_buf()));
                }
                for p in &all {
                    index.remove(p);
                }
                removed.extend(all);
                continue;
            }
            match index.remove_path(&rel) {
                Ok(entries) => removed.extend(entries.into_iter().map(|e| e.path)),
                Err(IndexError::PathNotFound(_)) => {
                    return Err(RepoError::PathNotFound(path.as_ref().to_path_buf()))
                }
                Err(e) => return Err(e.into()),
            }
        }

        locked.save()?;
        debug!(removed = removed.len(), "unstaged");
        Ok(removed)
    }

    /// `/`-separated path of `abs` relative to the work tree.
    fn relative(&self, abs: &Path) -> RepoResult<String> {
        let rel = abs
            .strip_prefix(self.layout.work_tree())
            .map_err(|_| RepoError::PathOutsideRepository(abs.to_path_buf()))?;
        join_components(abs, rel.components())
    }

    /// Like [`relative`](Self::relative) for paths that may no longer exist:
    /// `.` and `..` are resolved lexically and only the parent directory is
    /// canonicalized, so a symlink names itself rather than its target.
    fn lexical_relative(&self, path: &Path) -> RepoResult<String> {
        let mut normal = PathBuf::new();
        for component in self.layout.work_tree().join(path).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normal.pop();
                }
                other => normal.push(other),
            }
        }
        let abs = match (normal.parent(), normal.file_name()) {
            (Some(parent), Some(name)) => match parent.canonicalize() {
                Ok(parent) => parent.join(name),
                Err(_) => normal.clone(),
            },
            _ => normal.clone(),
        };
        let rel = abs
            .strip_prefix(self.layout.work_tree())
            .map_err(|_| RepoError::PathOutsideRepository(path.to_path_buf()))?;
        join_components(path, rel.components())
    }

    // ---- Objects ----

    /// Look up `object_ref` (a full or abbreviated hex id) and render it.
    pub fn inspect(&self, object_ref: &str, mode: InspectMode) -> RepoResult<Inspection> {
        let id = self.store.resolve(object_ref.trim())?;
        let object = self.store.read(&id)?;
        Ok(Inspection::of(&object, mode))
    }

    /// Write the trees for the current index and return the root tree id.
    pub fn write_tree(&self) -> RepoResult<ObjectId> {
        let index = self.index()?;
        let id = index.write_tree(&self.store)?;
        debug!(id = %id.short_hex(), entries = index.len(), "wrote tree");
        Ok(id)
    }

    /// Commit the index on top of `HEAD` and advance it.
    pub fn commit(
        &self,
        message: &str,
        author: &Signature,
        committer: &Signature,
    ) -> RepoResult<ObjectId> {
        let head = self.head()?;
        let tree = self.write_tree()?;
        let parents: Vec<ObjectId> = self.head_commit()?.into_iter().collect();

        let commit = commit_from_fields(
            tree,
            parents.clone(),
            author.clone(),
            committer.clone(),
            message,
        )?;
        let id = self.store.write(&commit)?;

        match &head {
            HeadRef::Branch(name) => refs::update_ref(&self.layout, name, &id)?,
            HeadRef::Detached(_) => refs::write_head(&self.layout, &HeadRef::Detached(id))?,
        }
        info!(
            id = %id.short_hex(),
            tree = %tree.short_hex(),
            parents = parents.len(),
            head = %head,
            "committed"
        );
        Ok(id)
    }

    // ---- Refs ----

    pub fn head(&self) -> RepoResult<HeadRef> {
        refs::read_head(&self.layout)
    }

    /// Commit `HEAD` resolves to, or `None` before the first commit.
    pub fn head_commit(&self) -> RepoResult<Option<ObjectId>> {
        match self.head()? {
            HeadRef::Branch(name) => refs::read_ref(&self.layout, &name),
            HeadRef::Detached(id) => Ok(Some(id)),
        }
    }

    // ---- Status ----

    /// Compare the work tree with the index.
    ///
    /// Unreadable directories and file names that cannot be tracked are
    /// logged and left out of `untracked`.
    pub fn status(&self) -> RepoResult<WorkdirStatus> {
        let index = self.index()?;
        let mut status = WorkdirStatus::new();

        for entry in index.iter() {
            let file = self.layout.work_tree().join(&entry.path);
            match check_entry(entry, &file)? {
                FileState::Clean => {}
                FileState::Modified => status.modified.push(entry.path.clone()),
                FileState::Deleted => status.deleted.push(entry.path.clone()),
            }
        }

        let walker = WalkDir::new(self.layout.work_tree())
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != OsStr::new(META_DIR));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        path = ?err.path(),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = match self.relative(entry.path()) {
                Ok(rel) => rel,
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "skipping untracked path");
                    continue;
                }
            };
            if !index.contains(&rel) {
                status.untracked.push(rel);
            }
        }
        status.untracked.sort();
        Ok(status)
    }
}

fn join_components<'a>(
    original: &Path,
    components: impl Iterator<Item = Component<'a>>,
) -> RepoResult<String> {
    let mut parts = Vec::new();
    for component in components {
        match component {
            Component::Normal(name) => {
                let name = name
                    .to_str()
                    .ok_or_else(|| IndexError::InvalidPath(original.display().to_string()))?;
                parts.push(name);
            }
            _ => return Err(IndexError::InvalidPath(original.display().to_string()).into()),
        }
    }
    if parts.first() == Some(&META_DIR) {
        return Err(RepoError::PathOutsideRepository(original.to_path_buf()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use toygit_index::IndexLock;
    use toygit_object::{identify, Object, ObjectKind};
    use toygit_store::StoreError;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    }

    fn repo() -> (tempfile::TempDir, Repository) {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path(), false).unwrap();
        (dir, repo)
    }

    fn write(repo: &Repository, rel: &str, content: &str) {
        let path = repo.work_tree().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sig() -> Signature {
        Signature::new("Tess", "tess@example.com", 1_700_000_000, 60).unwrap()
    }

    fn quick_lock(repo: &Repository, stale_secs: u64) {
        let mut config = repo.config().clone();
        config.index.lock_timeout_ms = 50;
        config.index.lock_retry_ms = 5;
        config.index.stale_lock_secs = stale_secs;
        config.save(&repo.layout().config_path()).unwrap();
    }

    // ---- init / open ----

    #[test]
    fn init_creates_layout() {
        let (_dir, repo) = repo();
        let meta = repo.layout().meta_dir();
        assert!(meta.join("objects").is_dir());
        assert!(meta.join("refs/heads").is_dir());
        assert!(meta.join("refs/tags").is_dir());
        assert_eq!(
            fs::read_to_string(meta.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
        assert!(meta.join("config").is_file());
        assert!(!meta.join("index").exists());
        assert_eq!(repo.head().unwrap().branch_name(), Some("main"));
        assert_eq!(repo.head_commit().unwrap(), None);
    }

    #[test]
    fn reinit_without_force_fails() {
        let (dir, _repo) = repo();
        assert!(matches!(
            Repository::init(dir.path(), false),
            Err(RepoError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn reinit_with_force_keeps_state() {
        let (dir, repo) = repo();
        write(&repo, "a.txt", "keep me");
        repo.stage(&["a.txt"]).unwrap();
        let head = repo.layout().head_path();
        fs::write(&head, "ref: refs/heads/dev\n").unwrap();
        fs::remove_dir_all(repo.layout().tags_dir()).unwrap();

        let again = Repository::init(dir.path(), true).unwrap();
        assert!(again.layout().tags_dir().is_dir());
        assert_eq!(fs::read_to_string(&head).unwrap(), "ref: refs/heads/dev\n");
        assert!(again.index().unwrap().contains("a.txt"));
        let id = identify(ObjectKind::Blob, b"keep me");
        assert!(again.store().exists(&id).unwrap());
    }

    #[test]
    fn init_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::init(dir.path().join("nope"), false),
            Err(RepoError::PathNotFound(_))
        ));
    }

    #[test]
    fn init_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            Repository::init(&file, false),
            Err(RepoError::NotADirectory(_))
        ));
    }

    #[test]
    fn open_plain_dir_is_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
        assert!(matches!(
            Repository::discover(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
    }

    #[test]
    fn discover_walks_up() {
        let (_dir, repo) = repo();
        let nested = repo.work_tree().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let found = Repository::discover(&nested).unwrap();
        assert_eq!(found.work_tree(), repo.work_tree());
    }

    #[test]
    fn invalid_config_fails_open() {
        let (dir, repo) = repo();
        fs::write(repo.layout().config_path(), "[core]\nmin_abbrev_len = 2\n").unwrap();
        assert!(matches!(Repository::open(dir.path()), Err(RepoError::Config(_))));
    }

    // ---- stage ----

    #[test]
    fn stage_then_inspect_hello() {
        let (_dir, repo) = repo();
        write(&repo, "hello.txt", "hi\n");

        let report = repo.stage(&["hello.txt"]).unwrap();
        assert!(report.is_success());
        assert_eq!(report.staged.len(), 1);
        let id = report.staged[0].object_id;
        assert_eq!(id, identify(ObjectKind::Blob, b"hi\n"));
        assert!(repo.store().object_path(&id).is_file());
        let stored = WalkDir::new(repo.layout().objects_dir())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .count();
        assert_eq!(stored, 1);

        let index = repo.index().unwrap();
        assert_eq!(index.len(), 1);
        let entry = index.get("hello.txt").unwrap();
        assert_eq!(entry.object_id, id);
        assert_eq!(entry.size, 3);

        let hex = id.to_hex();
        let show = |mode| repo.inspect(&hex, mode).unwrap().to_string();
        assert_eq!(show(InspectMode::Pretty), "hi\n");
        assert_eq!(show(InspectMode::Type), "blob");
        assert_eq!(show(InspectMode::Size), "3");
        assert_eq!(show(InspectMode::Raw), "hi\n");
    }

    #[test]
    fn inspect_by_abbreviation() {
        let (_dir, repo) = repo();
        write(&repo, "hello.txt", "hi\n");
        let id = repo.stage(&["hello.txt"]).unwrap().staged[0].object_id;
        let hex = id.to_hex();

        let upper = hex[..8].to_ascii_uppercase();
        assert_eq!(
            repo.inspect(&upper, InspectMode::Type).unwrap(),
            Inspection::Type(ObjectKind::Blob)
        );
        assert!(matches!(
            repo.inspect(&hex[..2], InspectMode::Type),
            Err(RepoError::Store(StoreError::PrefixTooShort { .. }))
        ));
        assert!(matches!(
            repo.inspect("zzz0", InspectMode::Type),
            Err(RepoError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn stage_same_content_twice_is_one_object() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "same");
        write(&repo, "b.txt", "same");
        let report = repo.stage(&["a.txt", "b.txt"]).unwrap();
        assert_eq!(report.staged[0].object_id, report.staged[1].object_id);

        let shards: Vec<_> = fs::read_dir(repo.layout().objects_dir()).unwrap().collect();
        assert_eq!(shards.len(), 1);
        assert_eq!(repo.index().unwrap().len(), 2);
    }

    #[test]
    fn stage_directory_recurses_and_skips_meta() {
        let (_dir, repo) = repo();
        write(&repo, "src/main.rs", "fn main() {}\n");
        write(&repo, "src/lib/util.rs", "// util\n");
        write(&repo, "README", "readme\n");

        let report = repo.stage(&["."]).unwrap();
        assert!(report.is_success());
        let paths: Vec<_> = report.staged.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, ["README", "src/lib/util.rs", "src/main.rs"]);
        assert!(repo.index().unwrap().iter().all(|e| !e.path.starts_with(META_DIR)));
    }

    #[test]
    fn stage_absolute_path_inside() {
        let (_dir, repo) = repo();
        write(&repo, "abs.txt", "x");
        let abs = repo.work_tree().join("abs.txt");
        let report = repo.stage(&[abs]).unwrap();
        assert_eq!(report.staged[0].path, "abs.txt");
    }

    #[cfg(unix)]
    #[test]
    fn stage_skips_symlinks() {
        let (_dir, repo) = repo();
        write(&repo, "real.txt", "real");
        std::os::unix::fs::symlink("real.txt", repo.work_tree().join("link")).unwrap();

        let report = repo.stage(&["."]).unwrap();
        let paths: Vec<_> = report.staged.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, ["real.txt"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("link"));

        let report = repo.stage(&["link"]).unwrap();
        assert!(report.staged.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn stage_reports_partial_failure() {
        let (_dir, repo) = repo();
        write(&repo, "ok.txt", "fine");
        let report = repo.stage(&["missing.txt", "ok.txt"]).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.staged.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].error, RepoError::PathNotFound(_)));
        assert!(repo.index().unwrap().contains("ok.txt"));
    }

    #[test]
    fn stage_outside_repository_fails() {
        let (_dir, repo) = repo();
        let other = tempfile::tempdir().unwrap();
        let outside = other.path().join("out.txt");
        fs::write(&outside, "x").unwrap();

        let report = repo.stage(&[outside]).unwrap();
        assert!(matches!(
            report.failed[0].error,
            RepoError::PathOutsideRepository(_)
        ));
        let report = repo.stage(&[".toygit/HEAD"]).unwrap();
        assert!(matches!(
            report.failed[0].error,
            RepoError::PathOutsideRepository(_)
        ));
        assert!(!repo.layout().index_path().exists());
    }

    #[test]
    fn stage_file_over_directory_evicts() {
        let (_dir, repo) = repo();
        write(&repo, "x/inner.txt", "inner");
        repo.stage(&["x"]).unwrap();

        fs::remove_dir_all(repo.work_tree().join("x")).unwrap();
        write(&repo, "x", "now a file");
        let report = repo.stage(&["x"]).unwrap();
        assert_eq!(report.staged[0].evicted, ["x/inner.txt"]);
        let index = repo.index().unwrap();
        assert!(index.contains("x"));
        assert!(!index.contains("x/inner.txt"));
    }

    #[test]
    fn held_lock_blocks_staging() {
        let (dir, repo) = repo();
        quick_lock(&repo, 600);
        let repo = Repository::open(dir.path()).unwrap();
        write(&repo, "a.txt", "a");

        let _held = IndexLock::acquire(&repo.layout().index_path(), &Default::default()).unwrap();
        assert!(matches!(
            repo.stage(&["a.txt"]),
            Err(RepoError::Index(IndexError::IndexLocked { .. }))
        ));
    }

    #[test]
    fn old_lock_is_stale() {
        let (dir, repo) = repo();
        quick_lock(&repo, 0);
        let repo = Repository::open(dir.path()).unwrap();
        write(&repo, "a.txt", "a");
        fs::write(IndexLock::lock_path_for(&repo.layout().index_path()), b"").unwrap();
        std::thread::sleep(Duration::from_millis(10));

        assert!(matches!(
            repo.stage(&["a.txt"]),
            Err(RepoError::Index(IndexError::StaleLock { .. }))
        ));
    }

    #[test]
    fn corrupt_object_is_reported() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "payload");
        let id = repo.stage(&["a.txt"]).unwrap().staged[0].object_id;

        let path = repo.store().object_path(&id);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            repo.inspect(&id.to_hex(), InspectMode::Pretty),
            Err(RepoError::Store(StoreError::CorruptObject { .. }))
        ));
    }

    // ---- unstage ----

    #[test]
    fn unstage_file_and_directory() {
        let (_dir, repo) = repo();
        write(&repo, "keep.txt", "k");
        write(&repo, "dir/a", "a");
        write(&repo, "dir/b", "b");
        repo.stage(&["."]).unwrap();

        let removed = repo.unstage(&["dir"]).unwrap();
        assert_eq!(removed, ["dir/a", "dir/b"]);
        let removed = repo.unstage(&["./keep.txt"]).unwrap();
        assert_eq!(removed, ["keep.txt"]);
        assert!(repo.index().unwrap().is_empty());
    }

    #[test]
    fn unstage_unknown_path_changes_nothing() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "a");
        repo.stage(&["a.txt"]).unwrap();

        assert!(matches!(
            repo.unstage(&["a.txt", "nope"]),
            Err(RepoError::PathNotFound(_))
        ));
        assert!(repo.index().unwrap().contains("a.txt"));
    }

    #[test]
    fn unstage_work_tree_clears_index() {
        let (_dir, repo) = repo();
        write(&repo, "a", "a");
        write(&repo, "b/c", "c");
        repo.stage(&["."]).unwrap();
        assert_eq!(repo.unstage(&["."]).unwrap().len(), 2);
        assert!(repo.index().unwrap().is_empty());
    }

    #[test]
    fn unstage_deleted_file() {
        let (_dir, repo) = repo();
        write(&repo, "dir/a.txt", "a");
        repo.stage(&["dir"]).unwrap();
        fs::remove_dir_all(repo.work_tree().join("dir")).unwrap();
        assert_eq!(repo.unstage(&["dir/a.txt"]).unwrap(), ["dir/a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn unstage_symlink_names_the_link() {
        let (_dir, repo) = repo();
        write(&repo, "real.txt", "real");
        write(&repo, "sub/inner.txt", "inner");
        repo.stage(&["."]).unwrap();
        std::os::unix::fs::symlink("real.txt", repo.work_tree().join("link")).unwrap();
        std::os::unix::fs::symlink("sub", repo.work_tree().join("sublink")).unwrap();

        for link in ["link", "sublink"] {
            assert!(matches!(
                repo.unstage(&[link]),
                Err(RepoError::PathNotFound(_))
            ));
        }
        let index = repo.index().unwrap();
        assert!(index.contains("real.txt"));
        assert!(index.contains("sub/inner.txt"));
    }

    #[test]
    fn unstage_parent_outside_fails() {
        let (_dir, repo) = repo();
        assert!(matches!(
            repo.unstage(&["../elsewhere"]),
            Err(RepoError::PathOutsideRepository(_))
        ));
    }

    // ---- concurrency ----

    #[test]
    fn concurrent_staging_keeps_every_update() {
        let (dir, repo) = repo();
        let mut config = repo.config().clone();
        config.index.lock_timeout_ms = 30_000;
        config.save(&repo.layout().config_path()).unwrap();

        let names: Vec<String> = (0..12).map(|i| format!("file-{i:02}.txt")).collect();
        for name in &names {
            write(&repo, name, name);
        }
        std::thread::scope(|scope| {
            for name in &names {
                let root = dir.path();
                scope.spawn(move || {
                    let repo = Repository::open(root).unwrap();
                    let report = repo.stage(&[name.as_str()]).unwrap();
                    assert_eq!(report.staged.len(), 1);
                });
            }
        });

        let index = repo.index().unwrap();
        assert_eq!(index.len(), names.len());
        assert!(names.iter().all(|name| index.contains(name)));
    }

    // ---- commit ----

    #[test]
    fn empty_index_writes_empty_tree() {
        let (_dir, repo) = repo();
        let id = repo.write_tree().unwrap();
        assert_eq!(id, identify(ObjectKind::Tree, b""));
    }

    #[test]
    fn commits_chain_and_advance_branch() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "one");
        repo.stage(&["a.txt"]).unwrap();
        let first = repo.commit("first\n", &sig(), &sig()).unwrap();

        let ref_file = repo.layout().ref_path("refs/heads/main");
        assert_eq!(fs::read_to_string(&ref_file).unwrap(), format!("{}\n", first.to_hex()));
        assert_eq!(repo.head_commit().unwrap(), Some(first));

        write(&repo, "a.txt", "two");
        repo.stage(&["a.txt"]).unwrap();
        let second = repo.commit("second\n", &sig(), &sig()).unwrap();
        assert_eq!(repo.head_commit().unwrap(), Some(second));

        let object = repo.store().read(&second).unwrap();
        let commit = match &object {
            Object::Commit(commit) => commit,
            other => panic!("expected commit, got {:?}", other.kind()),
        };
        assert_eq!(commit.parents, [first]);
        assert_eq!(commit.tree, repo.write_tree().unwrap());
        assert_eq!(
            repo.inspect(&second.to_hex(), InspectMode::Type).unwrap().to_string(),
            "commit"
        );
    }

    #[test]
    fn detached_head_moves_itself() {
        let (_dir, repo) = repo();
        let root = repo.commit("root\n", &sig(), &sig()).unwrap();
        refs::write_head(repo.layout(), &HeadRef::Detached(root)).unwrap();

        let next = repo.commit("next\n", &sig(), &sig()).unwrap();
        assert_eq!(repo.head().unwrap(), HeadRef::Detached(next));
        assert_eq!(
            refs::read_ref(repo.layout(), "refs/heads/main").unwrap(),
            Some(root)
        );
    }

    // ---- status ----

    #[test]
    fn status_reports_changes() {
        let (_dir, repo) = repo();
        write(&repo, "clean.txt", "clean");
        write(&repo, "edit.txt", "before");
        write(&repo, "gone.txt", "bye");
        repo.stage(&["."]).unwrap();
        assert!(repo.status().unwrap().is_clean());

        write(&repo, "edit.txt", "after, and longer");
        fs::remove_file(repo.work_tree().join("gone.txt")).unwrap();
        write(&repo, "new/file.txt", "new");

        let status = repo.status().unwrap();
        assert_eq!(status.modified, ["edit.txt"]);
        assert_eq!(status.deleted, ["gone.txt"]);
        assert_eq!(status.untracked, ["new/file.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn status_skips_untrackable_names() {
        use std::os::unix::ffi::OsStrExt;

        let (_dir, repo) = repo();
        write(&repo, "a.txt", "a");
        repo.stage(&["a.txt"]).unwrap();
        fs::write(repo.work_tree().join(OsStr::from_bytes(b"bad\xff")), "x").unwrap();
        write(&repo, "new.txt", "new");

        let status = repo.status().unwrap();
        assert!(status.modified.is_empty());
        assert!(status.deleted.is_empty());
        assert_eq!(status.untracked, ["new.txt"]);
    }
}
