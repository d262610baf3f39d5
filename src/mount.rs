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

//! Component C: the bind+remount idiom and its per-class flag policy.
//!
//! Every non-tmpfs mount the engine creates is `bind(src, dst)` followed by
//! `remount(dst, MS_BIND|MS_REMOUNT|flags)`, the `flags` fixed by which
//! class of thing is being mounted. `MountClass` is the polymorphism point
//! called for in the original design (one enum, not one function per
//! class); `Backend::remount` dispatches on it.

use nix::mount::MsFlags;

/// Which kind of thing is being bind-mounted, selecting the remount flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountClass {
    /// A driver binary or library file under `cfg.{bins,libs,libs32}_dir`.
    LibraryFile,
    /// A `/dev/nvidia*` character device node.
    DeviceNode,
    /// An AF_UNIX IPC socket path (e.g. persistenced).
    IpcSocket,
    /// A per-GPU `/proc/driver/nvidia/gpus/<busid>` directory.
    GpuProcfs,
    /// The synthesized `/proc/driver/nvidia` tmpfs root.
    ProcfsTmpfs,
    /// The synthesized app-profile tmpfs root.
    AppProfileTmpfs,
}

impl MountClass {
    /// The flags applied on the remount half of the bind+remount idiom.
    /// `MS_BIND|MS_REMOUNT` is added by the caller (`Backend::remount`);
    /// this returns only the class-specific mask from spec §4.C.
    pub fn remount_flags(&self) -> MsFlags {
        match self {
            MountClass::LibraryFile => MsFlags::MS_RDONLY | MsFlags::MS_NODEV | MsFlags::MS_NOSUID,
            MountClass::DeviceNode => MsFlags::MS_RDONLY | MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC,
            MountClass::IpcSocket => MsFlags::MS_NODEV | MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC,
            MountClass::GpuProcfs => {
                MsFlags::MS_RDONLY | MsFlags::MS_NODEV | MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC
            }
            MountClass::ProcfsTmpfs | MountClass::AppProfileTmpfs => {
                MsFlags::MS_NODEV | MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC
            }
        }
    }
}
