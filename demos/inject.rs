//! Exercises `mount_driver`/`mount_device` against a real container rootfs
//! using `LinuxBackend`. Needs `CAP_SYS_ADMIN` and an already-created
//! container mount namespace; not run as part of `cargo test`.

use std::os::unix::io::{AsRawFd, OwnedFd};
use std::path::PathBuf;

use color_eyre::Result;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::{makedev, Mode};
use simple_logger::SimpleLogger;

use nvidia_gpu_inject::model::{
    Container, ContainerFlags, ContainerPaths, Context, Device, DeviceNode, DriverInfo, MountNamespace, TaggedFile,
};
use nvidia_gpu_inject::{mount_device, mount_driver, LinuxBackend};

fn open_mnt_ns(pid: u32) -> Result<OwnedFd> {
    let path = format!("/proc/{pid}/ns/mnt");
    let fd = open(path.as_str(), OFlag::O_RDONLY, Mode::empty())?;
    Ok(fd)
}

fn main() -> Result<()> {
    SimpleLogger::new().init()?;

    let caller_ns = open_mnt_ns(std::process::id())?;
    let container_ns = open_mnt_ns(std::process::id())?;
    println!("caller namespace fd: {}", caller_ns.as_raw_fd());

    let container = Container {
        rootfs: PathBuf::from("./alpine-rootfs"),
        uid: 1000,
        gid: 1000,
        mnt_ns: MountNamespace::from_fd(container_ns),
        dev_cg: PathBuf::from("/sys/fs/cgroup/devices/demo"),
        flags: ContainerFlags::COMPUTE_LIBS | ContainerFlags::COMPUTE_BINS,
        paths: ContainerPaths {
            bins_dir: PathBuf::from("/usr/bin"),
            libs_dir: PathBuf::from("/usr/lib/x86_64-linux-gnu"),
            libs32_dir: PathBuf::from("/usr/lib/i386-linux-gnu"),
        },
    };

    let info = DriverInfo {
        bins: vec![TaggedFile::new("/usr/bin/nvidia-smi", ContainerFlags::COMPUTE_BINS)],
        libs: vec![TaggedFile::new(
            "/usr/lib/x86_64-linux-gnu/libcuda.so.535.104.05",
            ContainerFlags::COMPUTE_LIBS,
        )],
        libs32: vec![],
        ipcs: vec![PathBuf::from("/var/run/nvidia-persistenced/socket")],
        devs: vec![],
    };

    let mut ctx = Context::new(MountNamespace::from_fd(caller_ns));
    let mut backend = LinuxBackend;
    mount_driver(&mut ctx, &mut backend, &container, &info)?;

    let device = Device {
        node: DeviceNode { path: PathBuf::from("/dev/nvidia0"), dev_id: makedev(195, 0) },
        busid: "00000000:3b:00.0".to_string(),
    };
    mount_device(&mut ctx, &mut backend, &container, &device)?;

    println!("driver userspace injected");
    Ok(())
}
