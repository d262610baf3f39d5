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

//! Component H: the injection transaction. Orchestrates components A–G
//! under a mount-namespace switch, with full rollback on any failure.
//!
//! State machine (per call):
//! ```text
//! idle -> entered_ns -> mounting -> (ok -> exited_ns -> done)
//!                              \-> (err -> rollback -> exited_ns -> failed)
//! ```
//! `entered_ns -> mounting` is the only transition that may partially
//! succeed; every other transition is total.

use std::path::{Path, PathBuf};

use nix::sys::stat::{major, minor};

use crate::backend::Backend;
use crate::error::{Error, ErrorKind};
use crate::model::{
    Container, Context, Device, DeviceNode, DriverInfo, MountNamespace, TaggedFile,
    ContainerFlags, NV_DEVICE_MAJOR, NV_PERSISTENCED_SOCKET,
};
use crate::mount::MountClass;
use crate::{appprofile, cgroup, procfs, respath, symlink};

/// The reversible-action log: every mount target created so far, in
/// creation order. Cgroup writes are never recorded here (spec §4.H, §9):
/// they are a distinct, terminal action outside the transaction log.
#[derive(Default)]
struct MountLog(Vec<PathBuf>);

impl MountLog {
    /// Allocates with the upper bound spec §4.H.1 step 1 specifies:
    /// `2 + |bins| + |libs| + |libs32| + |ipcs| + |devs|`.
    fn with_capacity(cap: usize) -> Self {
        MountLog(Vec::with_capacity(cap))
    }

    fn push(&mut self, path: PathBuf) {
        self.0.push(path);
    }

    /// Unmounts and removes every recorded entry in reverse creation
    /// order. Errors are swallowed: rollback never masks the primary
    /// error that triggered it (spec §7).
    fn rollback(&self, backend: &mut impl Backend) {
        for path in self.0.iter().rev() {
            if let Err(e) = backend.unmount(path) {
                log::info!("failed to unmount {} during rollback: {e}", path.display());
            }
            backend.remove_path(path);
        }
    }
}

/// Scoped mount-namespace switch. Entering is fallible; restoring the
/// caller's namespace on drop is best-effort but asserted (spec §7:
/// "that is asserted (process-fatal), because continuing in the wrong
/// namespace is unsafe").
struct NsGuard<'ns, 'b, B: Backend + ?Sized> {
    backend: &'b mut B,
    caller_ns: &'ns MountNamespace,
}

impl<'ns, 'b, B: Backend + ?Sized> NsGuard<'ns, 'b, B> {
    fn enter(backend: &'b mut B, target: &MountNamespace, caller_ns: &'ns MountNamespace) -> Result<Self, Error> {
        backend.enter_namespace(target)?;
        Ok(NsGuard { backend, caller_ns })
    }

    /// Reborrows the backend for the duration of `mounting`, without
    /// moving it out of the guard (the guard's `Drop` still needs it).
    fn backend_mut(&mut self) -> &mut B {
        &mut *self.backend
    }
}

impl<'ns, 'b, B: Backend + ?Sized> Drop for NsGuard<'ns, 'b, B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.enter_namespace(self.caller_ns) {
            panic!("failed to restore caller mount namespace after injection: {e}");
        }
    }
}

fn mount_tagged_file(
    backend: &mut impl Backend,
    rootfs: &Path,
    dir: &Path,
    file: &TaggedFile,
    uid: u32,
    gid: u32,
) -> Result<PathBuf, Error> {
    let basename = file
        .path
        .file_name()
        .ok_or_else(|| Error::with_path(ErrorKind::InvalidArg, &file.path))?;
    let path = respath::resolve(rootfs, &dir.join(basename))?;
    let mode = backend.file_mode(&file.path)?;
    backend.ensure_file(&path, uid, gid, mode)?;
    log::info!("mounting {} at {}", file.path.display(), path.display());
    backend.bind_mount(&file.path, &path)?;
    backend.remount(&path, MountClass::LibraryFile)?;
    Ok(path)
}

/// Mounts every file in `files` whose capability tag intersects
/// `container_flags`, under `{rootfs}/{dir}`. Appends each mountpoint to
/// `log` as it is created.
fn mount_tagged_files(
    backend: &mut impl Backend,
    rootfs: &Path,
    dir: &Path,
    files: &[TaggedFile],
    container_flags: ContainerFlags,
    uid: u32,
    gid: u32,
    log: &mut MountLog,
) -> Result<Vec<PathBuf>, Error> {
    if files.is_empty() {
        return Ok(Vec::new());
    }
    let resolved_dir = respath::resolve(rootfs, dir)?;
    backend.ensure_dir(&resolved_dir, uid, gid, 0o755)?;

    let mut mounted = Vec::with_capacity(files.len());
    for file in files {
        if !container_flags.intersects(file.caps) {
            continue;
        }
        let path = mount_tagged_file(backend, rootfs, dir, file, uid, gid)?;
        log.push(path.clone());
        mounted.push(path);
    }
    Ok(mounted)
}

fn mount_device_node(
    backend: &mut impl Backend,
    rootfs: &Path,
    dev: &DeviceNode,
    uid: u32,
    gid: u32,
) -> Result<PathBuf, Error> {
    let path = respath::resolve(rootfs, &dev.path)?;
    let mode = backend.file_mode(&dev.path)?;
    backend.ensure_file(&path, uid, gid, mode)?;
    log::info!("mounting {} at {}", dev.path.display(), path.display());
    backend.bind_mount(&dev.path, &path)?;
    backend.remount(&path, MountClass::DeviceNode)?;
    Ok(path)
}

fn mount_ipc_socket(
    backend: &mut impl Backend,
    rootfs: &Path,
    ipc: &Path,
    uid: u32,
    gid: u32,
) -> Result<PathBuf, Error> {
    let path = respath::resolve(rootfs, ipc)?;
    let mode = backend.file_mode(ipc)?;
    backend.ensure_file(&path, uid, gid, mode)?;
    log::info!("mounting {} at {}", ipc.display(), path.display());
    backend.bind_mount(ipc, &path)?;
    backend.remount(&path, MountClass::IpcSocket)?;
    Ok(path)
}

fn mount_driver_inner(
    backend: &mut impl Backend,
    container: &Container,
    info: &DriverInfo,
    log: &mut MountLog,
) -> Result<(), Error> {
    let rootfs = container.rootfs.as_path();
    let uid = container.uid;
    let gid = container.gid;
    let flags = container.flags;

    // Step 2: procfs view.
    let procfs_mnt = procfs::mount_procfs_view(backend, rootfs, uid, gid)?;
    log.push(procfs_mnt);

    // Step 3: app-profile tmpfs, if GRAPHICS_LIBS.
    if flags.contains(ContainerFlags::GRAPHICS_LIBS) {
        let mnt = appprofile::mount_tmpfs(backend, rootfs, uid, gid)?;
        log.push(mnt);
    }

    // Step 4: binaries and libraries.
    let mut mounted_libs = mount_tagged_files(
        backend,
        rootfs,
        &container.paths.bins_dir,
        &info.bins,
        flags,
        uid,
        gid,
        log,
    )?;
    mounted_libs.extend(mount_tagged_files(
        backend,
        rootfs,
        &container.paths.libs_dir,
        &info.libs,
        flags,
        uid,
        gid,
        log,
    )?);
    if flags.contains(ContainerFlags::COMPAT32) {
        mounted_libs.extend(mount_tagged_files(
            backend,
            rootfs,
            &container.paths.libs32_dir,
            &info.libs32,
            flags,
            uid,
            gid,
            log,
        )?);
    }

    // Step 5: ABI-compatibility symlinks.
    for path in &mounted_libs {
        symlink::link_for_mounted_library(backend, path, uid, gid)?;
    }

    // Step 6: IPC sockets.
    for ipc in &info.ipcs {
        let admitted = if ipc.as_path() == Path::new(NV_PERSISTENCED_SOCKET) {
            flags.contains(ContainerFlags::UTILITY_LIBS)
        } else {
            flags.contains(ContainerFlags::COMPUTE_LIBS)
        };
        if !admitted {
            continue;
        }
        let mnt = mount_ipc_socket(backend, rootfs, ipc, uid, gid)?;
        log.push(mnt);
    }

    // Step 7: devices.
    for dev in &info.devs {
        let admitted = flags.contains(ContainerFlags::COMPUTE_LIBS) || major(dev.dev_id) as u32 == NV_DEVICE_MAJOR;
        if !admitted {
            continue;
        }
        if !flags.contains(ContainerFlags::NO_DEVBIND) {
            let mnt = mount_device_node(backend, rootfs, dev, uid, gid)?;
            log.push(mnt);
        }
        if !flags.contains(ContainerFlags::NO_CGROUPS) {
            cgroup::authorize(backend, &container.dev_cg, dev.dev_id)?;
        }
    }

    Ok(())
}

/// One-shot bulk injection of a driver's userspace into an already-created
/// container. See spec §4.H.1.
pub fn mount_driver(
    ctx: &mut Context,
    backend: &mut impl Backend,
    container: &Container,
    info: &DriverInfo,
) -> Result<(), Error> {
    let mut guard = NsGuard::enter(backend, &container.mnt_ns, &ctx.caller_mnt_ns)?;
    let mut log = MountLog::with_capacity(info.max_mounts());
    let result = mount_driver_inner(guard.backend_mut(), container, info, &mut log);
    if let Err(ref e) = result {
        log.rollback(guard.backend_mut());
        ctx.report(e);
    }
    drop(guard);
    result
}

fn mount_device_inner(
    backend: &mut impl Backend,
    container: &Container,
    device: &Device,
    log: &mut MountLog,
) -> Result<(), Error> {
    let rootfs = container.rootfs.as_path();
    let uid = container.uid;
    let gid = container.gid;
    let flags = container.flags;

    if !flags.contains(ContainerFlags::NO_DEVBIND) {
        let observed = backend.stat_rdev(&device.node.path)?;
        if observed != device.node.dev_id {
            return Err(Error::with_path(ErrorKind::InvalidState, &device.node.path));
        }
        let mnt = mount_device_node(backend, rootfs, &device.node, uid, gid)?;
        log.push(mnt);
    }

    let proc_mnt = procfs::mount_procfs_gpu(backend, rootfs, device.procfs_busid(), uid, gid)?;
    log.push(proc_mnt);

    if flags.contains(ContainerFlags::GRAPHICS_LIBS) {
        appprofile::admit_minor(backend, rootfs, minor(device.node.dev_id), uid, gid)?;
    }

    if !flags.contains(ContainerFlags::NO_CGROUPS) {
        cgroup::authorize(backend, &container.dev_cg, device.node.dev_id)?;
    }

    Ok(())
}

/// Per-GPU addendum, invoked once per GPU admitted after driver mount.
/// See spec §4.H.2.
pub fn mount_device(
    ctx: &mut Context,
    backend: &mut impl Backend,
    container: &Container,
    device: &Device,
) -> Result<(), Error> {
    let mut guard = NsGuard::enter(backend, &container.mnt_ns, &ctx.caller_mnt_ns)?;
    let mut log = MountLog::default();
    let result = mount_device_inner(guard.backend_mut(), container, device, &mut log);
    if let Err(ref e) = result {
        log.rollback(guard.backend_mut());
        ctx.report(e);
    }
    drop(guard);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::model::{ContainerPaths, TaggedFile};
    use nix::sys::stat::makedev;

    fn test_container(flags: ContainerFlags, fd: std::os::unix::io::OwnedFd) -> Container {
        Container {
            rootfs: PathBuf::from("/rootfs"),
            uid: 1000,
            gid: 1000,
            mnt_ns: MountNamespace::from_fd(fd),
            dev_cg: PathBuf::from("/sys/fs/cgroup/devices/c"),
            flags,
            paths: ContainerPaths {
                bins_dir: PathBuf::from("/usr/bin"),
                libs_dir: PathBuf::from("/usr/lib64"),
                libs32_dir: PathBuf::from("/usr/lib"),
            },
        }
    }

    fn dup_stdin() -> std::os::unix::io::OwnedFd {
        use std::os::unix::io::FromRawFd;
        // SAFETY: fd 0 is always valid in the test process; never read or
        // written through, only used as an opaque namespace token.
        unsafe { std::os::unix::io::OwnedFd::from_raw_fd(nix::libc::dup(0)) }
    }

    fn test_ctx() -> Context<'static> {
        Context::new(MountNamespace::from_fd(dup_stdin()))
    }

    // S1 — compute-only, no cgroups, one device.
    #[test]
    fn s1_compute_only_no_cgroups_one_device() {
        let mut backend = FakeBackend::new()
            .with_host_file("/usr/lib64/libcuda.so.470.57", b"cuda".to_vec(), 0o755)
            .with_host_file("/usr/bin/nvidia-smi", b"smi".to_vec(), 0o755)
            .with_host_device("/dev/nvidia0", 0o660, makedev(195, 0));
        let container = test_container(
            ContainerFlags::COMPUTE_LIBS | ContainerFlags::COMPUTE_BINS | ContainerFlags::NO_CGROUPS,
            dup_stdin(),
        );
        let info = DriverInfo {
            bins: vec![TaggedFile::new("/usr/bin/nvidia-smi", ContainerFlags::COMPUTE_BINS)],
            libs: vec![TaggedFile::new("/usr/lib64/libcuda.so.470.57", ContainerFlags::COMPUTE_LIBS)],
            libs32: vec![],
            ipcs: vec![],
            devs: vec![DeviceNode { path: PathBuf::from("/dev/nvidia0"), dev_id: makedev(195, 0) }],
        };
        let mut ctx = test_ctx();
        mount_driver(&mut ctx, &mut backend, &container, &info).unwrap();

        assert!(backend.exists(Path::new("/rootfs/usr/lib64/libcuda.so.470.57")));
        assert_eq!(
            backend.symlink_target(Path::new("/rootfs/usr/lib64/libcuda.so")).unwrap(),
            PathBuf::from("libcuda.so.470.57")
        );
        assert!(backend.exists(Path::new("/rootfs/usr/bin/nvidia-smi")));
        assert!(backend.exists(Path::new("/rootfs/dev/nvidia0")));
        assert!(backend.cgroup_writes.borrow().is_empty());
        assert!(!backend.exists(Path::new("/rootfs/usr/share/nvidia/nvidia-application-profiles-rc.d")));
    }

    // S2 — graphics, two GPUs added sequentially.
    #[test]
    fn s2_graphics_two_gpus_sequentially() {
        let mut backend = FakeBackend::new()
            .with_host_device("/dev/nvidia0", 0o660, makedev(195, 0))
            .with_host_device("/dev/nvidia3", 0o660, makedev(195, 3))
            .with_host_file("/proc/driver/nvidia/gpus/0000:3b:00.0", b"".to_vec(), 0o555)
            .with_host_file("/proc/driver/nvidia/gpus/0000:3b:00.3", b"".to_vec(), 0o555);
        let container = test_container(ContainerFlags::GRAPHICS_LIBS, dup_stdin());
        let info = DriverInfo::default();
        let mut ctx = test_ctx();
        mount_driver(&mut ctx, &mut backend, &container, &info).unwrap();

        assert!(backend.exists(Path::new("/rootfs/usr/share/nvidia/nvidia-application-profiles-rc.d")));
        assert!(backend
            .file_contents(Path::new(
                "/rootfs/usr/share/nvidia/nvidia-application-profiles-rc.d/10-container.conf"
            ))
            .is_none());

        let dev0 = Device { node: DeviceNode { path: PathBuf::from("/dev/nvidia0"), dev_id: makedev(195, 0) }, busid: "00000000:3b:00.0".to_string() };
        mount_device(&mut ctx, &mut backend, &container, &dev0).unwrap();
        let conf = Path::new("/rootfs/usr/share/nvidia/nvidia-application-profiles-rc.d/10-container.conf");
        let buf = backend.file_contents(conf).unwrap();
        assert!(std::str::from_utf8(&buf).unwrap().contains("0x1"));

        let dev3 = Device { node: DeviceNode { path: PathBuf::from("/dev/nvidia3"), dev_id: makedev(195, 3) }, busid: "00000000:3b:00.3".to_string() };
        mount_device(&mut ctx, &mut backend, &container, &dev3).unwrap();
        let buf = backend.file_contents(conf).unwrap();
        assert!(std::str::from_utf8(&buf).unwrap().contains("0x9"));
    }

    // S3 — rollback on bind failure.
    #[test]
    fn s3_rollback_on_second_library_bind_failure() {
        // mount calls in order: procfs tmpfs (1), libcuda bind (2), libnvidia bind (3, fails).
        let mut backend = FakeBackend::new()
            .with_host_file("/usr/lib64/libcuda.so.470.57", b"a".to_vec(), 0o755)
            .with_host_file("/usr/lib64/libnvidia-ml.so.470.57", b"b".to_vec(), 0o755)
            .fail_at_mount_call(3);
        let container = test_container(ContainerFlags::COMPUTE_LIBS, dup_stdin());
        let info = DriverInfo {
            bins: vec![],
            libs: vec![
                TaggedFile::new("/usr/lib64/libcuda.so.470.57", ContainerFlags::COMPUTE_LIBS),
                TaggedFile::new("/usr/lib64/libnvidia-ml.so.470.57", ContainerFlags::COMPUTE_LIBS),
            ],
            libs32: vec![],
            ipcs: vec![],
            devs: vec![],
        };
        let mut ctx = test_ctx();
        let err = mount_driver(&mut ctx, &mut backend, &container, &info).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Mount);
        // Every mount recorded before the failure was undone in reverse order.
        assert_eq!(backend.unmounts.borrow().len(), backend.mounted_paths().len());
        assert!(!backend.exists(Path::new("/rootfs/proc/driver/nvidia")));
        assert!(!backend.exists(Path::new("/rootfs/usr/lib64/libcuda.so.470.57")));
    }

    // S4 — path escape is rejected before any mount happens.
    #[test]
    fn s4_path_escape_rejected() {
        let mut backend = FakeBackend::new();
        let container = test_container(ContainerFlags::COMPUTE_LIBS, dup_stdin());
        let info = DriverInfo {
            bins: vec![],
            libs: vec![TaggedFile::new("/usr/lib64/libcuda.so.470.57", ContainerFlags::COMPUTE_LIBS)],
            libs32: vec![],
            ipcs: vec![],
            devs: vec![],
        };
        let mut bad_container = container;
        bad_container.paths.libs_dir = PathBuf::from("../../escape");
        let mut ctx = test_ctx();
        let err = mount_driver(&mut ctx, &mut backend, &bad_container, &info).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
        assert!(backend.mounted_paths().iter().all(|p| p.starts_with("/rootfs")));
    }

    // S5 — device id mismatch.
    #[test]
    fn s5_device_id_mismatch_is_invalid_state() {
        let mut backend = FakeBackend::new().with_host_device("/dev/nvidia0", 0o660, makedev(195, 1));
        let container = test_container(ContainerFlags::COMPUTE_LIBS, dup_stdin());
        let dev = Device {
            node: DeviceNode { path: PathBuf::from("/dev/nvidia0"), dev_id: makedev(195, 0) },
            busid: "00000000:3b:00.0".to_string(),
        };
        let mut ctx = test_ctx();
        let err = mount_device(&mut ctx, &mut backend, &container, &dev).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        assert!(backend.mounted_paths().is_empty());
        assert!(backend.cgroup_writes.borrow().is_empty());
    }

    // S6 — persistenced IPC gating.
    #[test]
    fn s6_persistenced_ipc_gating() {
        let mut backend = FakeBackend::new()
            .with_host_file(NV_PERSISTENCED_SOCKET, b"".to_vec(), 0o660)
            .with_host_file("/var/run/nvidia-fabricmanager/socket", b"".to_vec(), 0o660);
        let container = test_container(ContainerFlags::COMPUTE_LIBS, dup_stdin());
        let info = DriverInfo {
            bins: vec![],
            libs: vec![],
            libs32: vec![],
            ipcs: vec![
                PathBuf::from(NV_PERSISTENCED_SOCKET),
                PathBuf::from("/var/run/nvidia-fabricmanager/socket"),
            ],
            devs: vec![],
        };
        let mut ctx = test_ctx();
        mount_driver(&mut ctx, &mut backend, &container, &info).unwrap();
        assert!(!backend.exists(&Path::new("/rootfs").join(NV_PERSISTENCED_SOCKET.trim_start_matches('/'))));
        assert!(backend.exists(Path::new("/rootfs/var/run/nvidia-fabricmanager/socket")));

        let mut backend2 = FakeBackend::new()
            .with_host_file(NV_PERSISTENCED_SOCKET, b"".to_vec(), 0o660)
            .with_host_file("/var/run/nvidia-fabricmanager/socket", b"".to_vec(), 0o660);
        let container2 = test_container(ContainerFlags::UTILITY_LIBS, dup_stdin());
        let mut ctx2 = test_ctx();
        mount_driver(&mut ctx2, &mut backend2, &container2, &info).unwrap();
        assert!(backend2.exists(&Path::new("/rootfs").join(NV_PERSISTENCED_SOCKET.trim_start_matches('/'))));
        assert!(!backend2.exists(Path::new("/rootfs/var/run/nvidia-fabricmanager/socket")));
    }

    // Invariant 5: capability gating with flags = {} mounts only the procfs view.
    #[test]
    fn invariant_empty_flags_mounts_only_procfs_view() {
        let mut backend = FakeBackend::new()
            .with_host_file("/usr/lib64/libcuda.so.470.57", b"a".to_vec(), 0o755)
            .with_host_file("/usr/bin/nvidia-smi", b"b".to_vec(), 0o755)
            .with_host_device("/dev/nvidia0", 0o660, makedev(195, 0));
        let container = test_container(ContainerFlags::empty(), dup_stdin());
        let info = DriverInfo {
            bins: vec![TaggedFile::new("/usr/bin/nvidia-smi", ContainerFlags::COMPUTE_BINS)],
            libs: vec![TaggedFile::new("/usr/lib64/libcuda.so.470.57", ContainerFlags::COMPUTE_LIBS)],
            libs32: vec![],
            ipcs: vec![],
            devs: vec![DeviceNode { path: PathBuf::from("/dev/nvidia0"), dev_id: makedev(195, 0) }],
        };
        let mut ctx = test_ctx();
        mount_driver(&mut ctx, &mut backend, &container, &info).unwrap();
        assert_eq!(backend.mounted_paths(), vec![PathBuf::from("/rootfs/proc/driver/nvidia")]);
    }

    // Invariant 2: namespace balance across both ok and error paths.
    #[test]
    fn invariant_namespace_restored_on_success_and_failure() {
        let mut backend = FakeBackend::new().fail_at_mount_call(1);
        let container = test_container(ContainerFlags::empty(), dup_stdin());
        let info = DriverInfo::default();
        let mut ctx = test_ctx();
        let _ = mount_driver(&mut ctx, &mut backend, &container, &info);
        let log = backend.ns_log.borrow();
        assert_eq!(log.iter().filter(|e| *e == "enter").count(), 2);
    }

    // A non-admitted major on a non-compute container is skipped entirely
    // (display-major-only gating subset of invariant 5).
    #[test]
    fn display_device_skipped_without_compute_flag() {
        let mut backend = FakeBackend::new().with_host_device("/dev/dri/card0", 0o660, makedev(226, 0));
        let container = test_container(ContainerFlags::UTILITY_LIBS, dup_stdin());
        let info = DriverInfo {
            bins: vec![],
            libs: vec![],
            libs32: vec![],
            ipcs: vec![],
            devs: vec![DeviceNode { path: PathBuf::from("/dev/dri/card0"), dev_id: makedev(226, 0) }],
        };
        let mut ctx = test_ctx();
        mount_driver(&mut ctx, &mut backend, &container, &info).unwrap();
        assert!(!backend.exists(Path::new("/rootfs/dev/dri/card0")));
    }
}
