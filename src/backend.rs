/*
 * The MIT License
 * Copyright (c) 2022 Guillem Castro
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
 * THE SOFTWARE.
 */

//! The syscall/filesystem seam. Every side-effecting operation the engine
//! performs goes through this trait, so the transaction in `transaction.rs`
//! can run identically against the real kernel (`LinuxBackend`) or an
//! in-memory double (`FakeBackend`, test-only) that lets tests configure a
//! step to fail — the "stubbed filesystem + mount syscall" fixture the
//! testable properties need.

use std::path::{Path, PathBuf};

use nix::sys::stat::dev_t;

use crate::error::{Error, ErrorKind};
use crate::model::MountNamespace;
use crate::mount::MountClass;

pub trait Backend {
    /// `mkdir -p` semantics; a pre-existing directory is left untouched.
    fn ensure_dir(&mut self, path: &Path, uid: u32, gid: u32, mode: u32) -> Result<(), Error>;

    /// Creates an empty regular file to serve as a bind-mount target.
    /// Parent directories are created as 0755, owned by `uid`/`gid`.
    fn ensure_file(&mut self, path: &Path, uid: u32, gid: u32, mode: u32) -> Result<(), Error>;

    /// Atomically writes `content` as a regular file with the given mode.
    fn ensure_regular(
        &mut self,
        path: &Path,
        content: &[u8],
        uid: u32,
        gid: u32,
        mode: u32,
    ) -> Result<(), Error>;

    /// Creates a symlink; a no-op if an identical symlink already exists.
    fn ensure_symlink(&mut self, path: &Path, target: &Path, uid: u32, gid: u32) -> Result<(), Error>;

    /// Removes whatever is at `path` (file, empty or non-empty dir, symlink).
    /// Errors are never fatal — rollback callers swallow them.
    fn remove_path(&mut self, path: &Path);

    /// Reads a host file's content; `Ok(None)` means it did not exist.
    fn read_host_file(&self, path: &Path) -> Result<Option<Vec<u8>>, Error>;

    /// Appends text to a file in append mode, flushing before returning.
    fn append_file(&mut self, path: &Path, content: &str) -> Result<(), Error>;

    /// The mode bits of a host path (used to mirror a bind target's mode).
    fn file_mode(&self, path: &Path) -> Result<u32, Error>;

    /// `mount(2)` with `MS_BIND`.
    fn bind_mount(&mut self, src: &Path, dst: &Path) -> Result<(), Error>;

    /// `mount(2)` of a tmpfs with the given `mode=` option.
    fn mount_tmpfs(&mut self, dst: &Path, mode: u32) -> Result<(), Error>;

    /// `mount(2)` with `MS_BIND | MS_REMOUNT | class.remount_flags()`.
    fn remount(&mut self, dst: &Path, class: MountClass) -> Result<(), Error>;

    /// `umount2(2)` with `MNT_DETACH`. Errors are swallowed by rollback callers.
    fn unmount(&mut self, dst: &Path) -> Result<(), Error>;

    /// `stat(2)`'s `st_rdev` of a device node.
    fn stat_rdev(&self, path: &Path) -> Result<dev_t, Error>;

    /// `setns(2)` into the given mount namespace.
    fn enter_namespace(&mut self, ns: &MountNamespace) -> Result<(), Error>;

    /// The namespace handle for "the mount namespace this process is
    /// currently in", captured before any `enter_namespace` call.
    fn current_namespace(&self) -> Result<MountNamespace, Error>;
}

/// Production backend: every operation is the real Linux syscall.
pub struct LinuxBackend;

impl LinuxBackend {
    pub fn new() -> Self {
        LinuxBackend
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

mod linux_impl {
    use super::*;
    use nix::fcntl::OFlag;
    use nix::mount::{mount, umount2, MntFlags, MsFlags};
    use nix::sched::{setns, CloneFlags};
    use nix::sys::stat::{fchmodat, fstat, FchmodatFlags, Mode};
    use nix::unistd::{chown, Gid, Uid};
    use std::fs;
    use std::io::Write;
    use std::os::unix::fs::symlink;
    use std::os::unix::io::AsFd;

    fn fs_err(kind: ErrorKind, path: &Path, e: std::io::Error) -> Error {
        Error::from_io(kind, path, e)
    }

    fn mount_err(path: &Path, e: nix::Error) -> Error {
        Error::from_nix(ErrorKind::Mount, path, e)
    }

    impl super::Backend for super::LinuxBackend {
        fn ensure_dir(&mut self, path: &Path, uid: u32, gid: u32, mode: u32) -> Result<(), Error> {
            if path.is_dir() {
                return Ok(());
            }
            fs::create_dir_all(path).map_err(|e| fs_err(ErrorKind::Fs, path, e))?;
            chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)))
                .map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            fchmodat(
                None,
                path,
                Mode::from_bits_truncate(mode),
                FchmodatFlags::FollowSymlink,
            )
            .map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            Ok(())
        }

        fn ensure_file(&mut self, path: &Path, uid: u32, gid: u32, mode: u32) -> Result<(), Error> {
            if let Some(parent) = path.parent() {
                self.ensure_dir(parent, uid, gid, 0o755)?;
            }
            if path.exists() {
                let meta = fs::symlink_metadata(path).map_err(|e| fs_err(ErrorKind::Fs, path, e))?;
                if !meta.is_file() {
                    return Err(Error::with_path(ErrorKind::Fs, path));
                }
                return Ok(());
            }
            fs::File::create(path).map_err(|e| fs_err(ErrorKind::Fs, path, e))?;
            chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)))
                .map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            fchmodat(
                None,
                path,
                Mode::from_bits_truncate(mode),
                FchmodatFlags::FollowSymlink,
            )
            .map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            Ok(())
        }

        fn ensure_regular(
            &mut self,
            path: &Path,
            content: &[u8],
            uid: u32,
            gid: u32,
            mode: u32,
        ) -> Result<(), Error> {
            if let Some(parent) = path.parent() {
                self.ensure_dir(parent, uid, gid, 0o755)?;
            }
            let tmp = path.with_extension("tmp-write");
            {
                let mut f = fs::File::create(&tmp).map_err(|e| fs_err(ErrorKind::Fs, &tmp, e))?;
                f.write_all(content).map_err(|e| fs_err(ErrorKind::Fs, &tmp, e))?;
            }
            chown(&tmp, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)))
                .map_err(|e| Error::from_nix(ErrorKind::Fs, &tmp, e))?;
            fchmodat(
                None,
                &tmp,
                Mode::from_bits_truncate(mode),
                FchmodatFlags::FollowSymlink,
            )
            .map_err(|e| Error::from_nix(ErrorKind::Fs, &tmp, e))?;
            fs::rename(&tmp, path).map_err(|e| fs_err(ErrorKind::Fs, path, e))?;
            Ok(())
        }

        fn ensure_symlink(&mut self, path: &Path, target: &Path, uid: u32, gid: u32) -> Result<(), Error> {
            if let Ok(existing) = fs::read_link(path) {
                if existing == target {
                    return Ok(());
                }
                return Err(Error::with_path(ErrorKind::Fs, path));
            }
            if let Some(parent) = path.parent() {
                self.ensure_dir(parent, uid, gid, 0o755)?;
            }
            symlink(target, path).map_err(|e| fs_err(ErrorKind::Fs, path, e))?;
            nix::unistd::fchownat(
                None,
                path,
                Some(Uid::from_raw(uid)),
                Some(Gid::from_raw(gid)),
                nix::unistd::FchownatFlags::NoFollowSymlink,
            )
            .map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            Ok(())
        }

        fn remove_path(&mut self, path: &Path) {
            if let Ok(meta) = fs::symlink_metadata(path) {
                let _ = if meta.is_dir() {
                    fs::remove_dir_all(path)
                } else {
                    fs::remove_file(path)
                };
            }
        }

        fn read_host_file(&self, path: &Path) -> Result<Option<Vec<u8>>, Error> {
            match fs::read(path) {
                Ok(buf) => Ok(Some(buf)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(fs_err(ErrorKind::Fs, path, e)),
            }
        }

        fn append_file(&mut self, path: &Path, content: &str) -> Result<(), Error> {
            use std::fs::OpenOptions;
            let mut f = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| fs_err(ErrorKind::Cgroup, path, e))?;
            f.write_all(content.as_bytes())
                .map_err(|e| fs_err(ErrorKind::Cgroup, path, e))?;
            f.flush().map_err(|e| fs_err(ErrorKind::Cgroup, path, e))?;
            Ok(())
        }

        fn file_mode(&self, path: &Path) -> Result<u32, Error> {
            let meta = fs::symlink_metadata(path).map_err(|e| fs_err(ErrorKind::Fs, path, e))?;
            use std::os::unix::fs::PermissionsExt;
            Ok(meta.permissions().mode())
        }

        fn bind_mount(&mut self, src: &Path, dst: &Path) -> Result<(), Error> {
            mount(Some(src), dst, None::<&str>, MsFlags::MS_BIND, None::<&str>)
                .map_err(|e| mount_err(dst, e))
        }

        fn mount_tmpfs(&mut self, dst: &Path, mode: u32) -> Result<(), Error> {
            let opts = format!("mode={mode:04o}");
            mount(Some("tmpfs"), dst, Some("tmpfs"), MsFlags::empty(), Some(opts.as_str()))
                .map_err(|e| mount_err(dst, e))
        }

        fn remount(&mut self, dst: &Path, class: MountClass) -> Result<(), Error> {
            let flags = MsFlags::MS_BIND | MsFlags::MS_REMOUNT | class.remount_flags();
            mount(None::<&str>, dst, None::<&str>, flags, None::<&str>).map_err(|e| mount_err(dst, e))
        }

        fn unmount(&mut self, dst: &Path) -> Result<(), Error> {
            umount2(dst, MntFlags::MNT_DETACH).map_err(|e| mount_err(dst, e))
        }

        fn stat_rdev(&self, path: &Path) -> Result<dev_t, Error> {
            let fd = nix::fcntl::open(path, OFlag::O_PATH, Mode::empty())
                .map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            let st = fstat(&fd).map_err(|e| Error::from_nix(ErrorKind::Fs, path, e))?;
            Ok(st.st_rdev as dev_t)
        }

        fn enter_namespace(&mut self, ns: &MountNamespace) -> Result<(), Error> {
            setns(ns.as_fd(), CloneFlags::CLONE_NEWNS)
                .map_err(|e| Error::from_nix(ErrorKind::Mount, "<mount namespace>", e))
        }

        fn current_namespace(&self) -> Result<MountNamespace, Error> {
            let fd = nix::fcntl::open(
                Path::new("/proc/self/ns/mnt"),
                OFlag::O_RDONLY,
                Mode::empty(),
            )
            .map_err(|e| Error::from_nix(ErrorKind::Mount, "/proc/self/ns/mnt", e))?;
            Ok(MountNamespace::from_fd(fd))
        }
    }
}
