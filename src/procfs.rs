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

//! Component D: synthesizes a container-local `/proc/driver/nvidia` view.
//!
//! The host's procfs subtree is never bind-mounted wholesale — a tmpfs is
//! mounted in its place and populated with hand-picked, possibly-edited
//! copies of `params`, `version` and `registry`, plus (per GPU) a bind of
//! the host's per-busid `gpus/<id>` directory.

use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::error::Error;
use crate::model::NV_PROC_DRIVER;
use crate::mount::MountClass;
use crate::respath;

/// The literal the NVRM driver looks for; patched in place so the driver
/// does not recreate the device nodes the engine just bound in.
const MODIFY_DEVICE_FILES_ON: &str = "ModifyDeviceFiles: 1";

/// Files synthesized under the procfs tmpfs, in the fixed order spec'd.
const FILES: [&str; 3] = ["params", "version", "registry"];

/// Rewrites the first `ModifyDeviceFiles: 1` occurrence in `buf` to end in
/// `0` instead of `1`. A no-op if the literal with `0` is already present,
/// or if `ModifyDeviceFiles:` is absent entirely.
fn patch_modify_device_files(buf: &mut Vec<u8>) {
    let needle = MODIFY_DEVICE_FILES_ON.as_bytes();
    if let Some(pos) = buf.windows(needle.len()).position(|w| w == needle) {
        let one_idx = pos + needle.len() - 1;
        buf[one_idx] = b'0';
    }
}

/// Mounts the synthesized `/proc/driver/nvidia` tmpfs and populates it.
/// Returns the resolved container-local tmpfs root, which the caller
/// records in the mount log.
pub fn mount_procfs_view(
    backend: &mut impl Backend,
    rootfs: &Path,
    uid: u32,
    gid: u32,
) -> Result<PathBuf, Error> {
    let path = respath::resolve(rootfs, Path::new(NV_PROC_DRIVER))?;
    backend.ensure_dir(&path, uid, gid, 0o755)?;
    log::info!("mounting tmpfs at {}", path.display());
    backend.mount_tmpfs(&path, 0o555)?;

    for name in FILES {
        let host_path = Path::new(NV_PROC_DRIVER).join(name);
        let content = match backend.read_host_file(&host_path)? {
            Some(c) => c,
            None => continue,
        };
        let mode = backend.file_mode(&host_path)?;
        let mut content = content;
        if name == "params" {
            patch_modify_device_files(&mut content);
        }
        let dst = path.join(name);
        backend.ensure_regular(&dst, &content, uid, gid, mode)?;
    }

    backend.remount(&path, MountClass::ProcfsTmpfs)?;
    Ok(path)
}

/// Bind-mounts the host's per-GPU procfs directory for `busid_suffix`
/// (the 16-bit-domain form returned by [`crate::model::Device::procfs_busid`])
/// onto the corresponding path under the container's procfs tmpfs. Returns
/// the resolved mountpoint.
pub fn mount_procfs_gpu(
    backend: &mut impl Backend,
    rootfs: &Path,
    busid_suffix: &str,
    uid: u32,
    gid: u32,
) -> Result<PathBuf, Error> {
    let host_gpu = Path::new(NV_PROC_DRIVER).join("gpus").join(busid_suffix);
    let path = respath::resolve(rootfs, &host_gpu)?;

    let mode = backend.file_mode(&host_gpu)?;
    let is_dir = nix::sys::stat::SFlag::from_bits_truncate(mode).contains(nix::sys::stat::SFlag::S_IFDIR);
    if is_dir {
        backend.ensure_dir(&path, uid, gid, mode)?;
    } else {
        backend.ensure_file(&path, uid, gid, mode)?;
    }
    log::info!("mounting {} at {}", host_gpu.display(), path.display());
    backend.bind_mount(&host_gpu, &path)?;
    backend.remount(&path, MountClass::GpuProcfs)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;

    #[test]
    fn rewrites_modify_device_files_on_to_off() {
        let mut buf = b"NVRM\nModifyDeviceFiles: 1\nOther: 2\n".to_vec();
        patch_modify_device_files(&mut buf);
        assert_eq!(buf, b"NVRM\nModifyDeviceFiles: 0\nOther: 2\n");
    }

    #[test]
    fn leaves_modify_device_files_off_untouched() {
        let mut buf = b"NVRM\nModifyDeviceFiles: 0\n".to_vec();
        patch_modify_device_files(&mut buf);
        assert_eq!(buf, b"NVRM\nModifyDeviceFiles: 0\n");
    }

    #[test]
    fn leaves_buffer_without_the_field_untouched() {
        let mut buf = b"NVRM driver build only\n".to_vec();
        let before = buf.clone();
        patch_modify_device_files(&mut buf);
        assert_eq!(buf, before);
    }

    #[test]
    fn missing_host_files_are_skipped_not_errors() {
        let mut b = FakeBackend::new();
        let rootfs = Path::new("/rootfs");
        let mnt = mount_procfs_view(&mut b, rootfs, 0, 0).unwrap();
        assert_eq!(mnt, rootfs.join("proc/driver/nvidia"));
        assert!(b.file_contents(&mnt.join("params")).is_none());
    }

    #[test]
    fn params_are_patched_version_and_registry_copied_verbatim() {
        let mut b = FakeBackend::new()
            .with_host_file("/proc/driver/nvidia/params", &b"ModifyDeviceFiles: 1\n"[..], 0o444)
            .with_host_file("/proc/driver/nvidia/version", &b"NVRM 1.2.3\n"[..], 0o444)
            .with_host_file("/proc/driver/nvidia/registry", &b"a=1\n"[..], 0o444);
        let rootfs = Path::new("/rootfs");
        let mnt = mount_procfs_view(&mut b, rootfs, 1000, 1000).unwrap();
        assert_eq!(b.file_contents(&mnt.join("params")).unwrap(), b"ModifyDeviceFiles: 0\n");
        assert_eq!(b.file_contents(&mnt.join("version")).unwrap(), b"NVRM 1.2.3\n");
        assert_eq!(b.file_contents(&mnt.join("registry")).unwrap(), b"a=1\n");
    }

    #[test]
    fn gpu_mounts_at_the_busid_suffix_path() {
        let mut b = FakeBackend::new().with_host_device("/proc/driver/nvidia/gpus/0000:3b:00.0", 0o555, 0);
        let rootfs = Path::new("/rootfs");
        // host_device only registers an rdev/mode, not a regular file; treat
        // the procfs gpu dir's "mode" the same way file_mode looks it up.
        let mnt = mount_procfs_gpu(&mut b, rootfs, "0000:3b:00.0", 0, 0).unwrap();
        assert_eq!(mnt, rootfs.join("proc/driver/nvidia/gpus/0000:3b:00.0"));
    }

    #[test]
    fn gpu_host_directory_entries_are_bound_onto_a_directory_placeholder() {
        let mut b = FakeBackend::new();
        b.host_modes.insert(
            PathBuf::from("/proc/driver/nvidia/gpus/0000:3b:00.0"),
            nix::sys::stat::SFlag::S_IFDIR.bits() | 0o555,
        );
        let rootfs = Path::new("/rootfs");
        let mnt = mount_procfs_gpu(&mut b, rootfs, "0000:3b:00.0", 0, 0).unwrap();
        assert!(b.exists(&mnt));
    }
}
