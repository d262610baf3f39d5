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

use std::os::unix::io::OwnedFd;
use std::path::PathBuf;

use bitflags::bitflags;
use nix::sys::stat::dev_t;

bitflags! {
    /// Capability flags carried by a [`Container`], drawn from the same
    /// namespace as `nvidia-container-cli`'s `OPT_*` constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContainerFlags: u32 {
        const NO_CGROUPS    = 1 << 0;
        const NO_DEVBIND    = 1 << 1;
        const UTILITY_LIBS  = 1 << 2;
        const COMPUTE_LIBS  = 1 << 3;
        const VIDEO_LIBS    = 1 << 4;
        const GRAPHICS_LIBS = 1 << 5;
        const UTILITY_BINS  = 1 << 6;
        const COMPUTE_BINS  = 1 << 7;
        const COMPAT32      = 1 << 8;
    }
}

/// The NVIDIA char device major on Linux (`/dev/nvidia*`, pre-device-file-modernization).
pub const NV_DEVICE_MAJOR: u32 = 195;

/// Well-known path of the persistence daemon's control socket. Gated
/// separately from every other IPC path (see `transaction::mount_driver`).
pub const NV_PERSISTENCED_SOCKET: &str = "/var/run/nvidia-persistenced/socket";

/// Where the engine mounts its synthesized procfs view.
pub const NV_PROC_DRIVER: &str = "/proc/driver/nvidia";

/// Where the engine manages the application-profile override.
pub const NV_APP_PROFILE_DIR: &str = "/usr/share/nvidia/nvidia-application-profiles-rc.d";

/// An opaque handle to a Linux mount namespace, entered via `setns(2)`.
#[derive(Debug)]
pub struct MountNamespace {
    fd: OwnedFd,
}

impl MountNamespace {
    pub fn from_fd(fd: OwnedFd) -> Self {
        MountNamespace { fd }
    }

    pub fn as_fd(&self) -> &OwnedFd {
        &self.fd
    }
}

/// A host path tagged with the capability flags that admit mounting it.
/// The tag is supplied by the driver-discovery oracle (out of scope here);
/// the engine only ever tests `container.flags.intersects(caps)`.
#[derive(Debug, Clone)]
pub struct TaggedFile {
    pub path: PathBuf,
    pub caps: ContainerFlags,
}

impl TaggedFile {
    pub fn new(path: impl Into<PathBuf>, caps: ContainerFlags) -> Self {
        TaggedFile { path: path.into(), caps }
    }
}

/// A device node: its host path and the `dev_t` it is expected to carry.
#[derive(Debug, Clone)]
pub struct DeviceNode {
    pub path: PathBuf,
    pub dev_id: dev_t,
}

/// A GPU admitted by the caller after driver mount.
#[derive(Debug, Clone)]
pub struct Device {
    pub node: DeviceNode,
    /// PCI address in the host's 32-bit domain form, e.g. `00000000:3b:00.0`.
    pub busid: String,
}

impl Device {
    /// The 16-bit-domain busid suffix the procfs driver exposes under
    /// `/proc/driver/nvidia/gpus/`.
    pub fn procfs_busid(&self) -> &str {
        // The procfs driver drops the first 4 characters of the 32-bit
        // domain form, leaving the 16-bit form (e.g. "3b:00.0" prefixed by
        // the 16-bit domain digits).
        &self.busid[4.min(self.busid.len())..]
    }
}

/// Ordered sequences of driver files, supplied by the discovery oracle.
#[derive(Debug, Clone, Default)]
pub struct DriverInfo {
    pub bins: Vec<TaggedFile>,
    pub libs: Vec<TaggedFile>,
    pub libs32: Vec<TaggedFile>,
    pub ipcs: Vec<PathBuf>,
    pub devs: Vec<DeviceNode>,
}

impl DriverInfo {
    /// Upper bound on mount points this driver info can produce (§4.H.1 step 1).
    pub fn max_mounts(&self) -> usize {
        2 + self.bins.len() + self.libs.len() + self.libs32.len() + self.ipcs.len() + self.devs.len()
    }
}

/// Host-side directories a container places driver files into.
#[derive(Debug, Clone)]
pub struct ContainerPaths {
    pub bins_dir: PathBuf,
    pub libs_dir: PathBuf,
    pub libs32_dir: PathBuf,
}

/// An opaque handle to an already-created container, supplied by the runtime.
pub struct Container {
    pub rootfs: PathBuf,
    pub uid: u32,
    pub gid: u32,
    pub mnt_ns: MountNamespace,
    pub dev_cg: PathBuf,
    pub flags: ContainerFlags,
    pub paths: ContainerPaths,
}

/// Process-wide state: the caller's mount namespace (to return to) and an
/// optional structured error sink. Logging goes through the `log` facade
/// regardless of whether a sink is configured (see SPEC_FULL.md §5).
pub struct Context<'a> {
    pub caller_mnt_ns: MountNamespace,
    pub error_sink: Option<Box<dyn FnMut(&crate::error::Error) + 'a>>,
}

impl<'a> Context<'a> {
    pub fn new(caller_mnt_ns: MountNamespace) -> Self {
        Context { caller_mnt_ns, error_sink: None }
    }

    pub fn with_error_sink(mut self, sink: impl FnMut(&crate::error::Error) + 'a) -> Self {
        self.error_sink = Some(Box::new(sink));
        self
    }

    pub(crate) fn report(&mut self, err: &crate::error::Error) {
        if let Some(sink) = self.error_sink.as_mut() {
            sink(err);
        }
    }
}
