//! GPU driver selection by VM size.

use lazy_static::lazy_static;
use std::collections::HashSet;

const NVIDIA_GRID_DRIVER_VERSION: &str = "grid-535.161.08";
const NVIDIA_CUDA_DRIVER_VERSION: &str = "cuda-550.90.07";
const NVIDIA_470_CUDA_DRIVER_VERSION: &str = "cuda-470.82.01";
const AKS_GPU_GRID_SHA: &str = "sha-7b2b12";
const AKS_GPU_CUDA_SHA: &str = "sha-b40b85";

lazy_static! {
    /// Sizes whose cards need the "converged" GRID driver, which serves both CUDA and graphics
    /// workloads.  Plain CUDA drivers fail to install on these.
    static ref CONVERGED_GPU_DRIVER_SIZES: HashSet<&'static str> = [
        "standard_nv6ads_a10_v5",
        "standard_nv12ads_a10_v5",
        "standard_nv18ads_a10_v5",
        "standard_nv36ads_a10_v5",
        "standard_nv72ads_a10_v5",
        "standard_nv36adms_a10_v5",
        "standard_nc8ads_a10_v4",
        "standard_nc16ads_a10_v4",
        "standard_nc32ads_a10_v4",
    ]
    .into_iter()
    .collect();

    /// Multi-GPU boards connected by NVSwitch, which need the fabric manager service.
    static ref FABRIC_MANAGER_GPU_SIZES: HashSet<&'static str> = [
        "standard_nd96asr_v4",
        "standard_nd112asr_a100_v4",
        "standard_nd120asr_a100_v4",
        "standard_nd96amsr_a100_v4",
        "standard_nd112amsr_a100_v4",
        "standard_nd120amsr_a100_v4",
        "standard_nd96isr_h100_v5",
        "standard_nd96isr_h200_v5",
    ]
    .into_iter()
    .collect();
}

fn sku_name(vm_size: &str) -> String {
    let lower = vm_size.to_lowercase();
    lower.strip_suffix("_promo").unwrap_or(&lower).to_string()
}

fn use_grid_drivers(vm_size: &str) -> bool {
    CONVERGED_GPU_DRIVER_SIZES.contains(sku_name(vm_size).as_str())
}

// The original NC series (no version suffix) only works with the 470 CUDA branch.
fn is_standard_ncv1(vm_size: &str) -> bool {
    let size = sku_name(vm_size);
    size.starts_with("standard_nc") && !size.contains("_v")
}

pub fn gpu_driver_version(vm_size: &str) -> &'static str {
    if use_grid_drivers(vm_size) {
        NVIDIA_GRID_DRIVER_VERSION
    } else if is_standard_ncv1(vm_size) {
        NVIDIA_470_CUDA_DRIVER_VERSION
    } else {
        NVIDIA_CUDA_DRIVER_VERSION
    }
}

pub fn gpu_image_sha(vm_size: &str) -> &'static str {
    if use_grid_drivers(vm_size) {
        AKS_GPU_GRID_SHA
    } else {
        AKS_GPU_CUDA_SHA
    }
}

pub fn gpu_driver_type(vm_size: &str) -> &'static str {
    if use_grid_drivers(vm_size) {
        "grid"
    } else {
        "cuda"
    }
}

pub fn gpu_needs_fabric_manager(vm_size: &str) -> bool {
    FABRIC_MANAGER_GPU_SIZES.contains(sku_name(vm_size).as_str())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_sizes() {
        assert_eq!(gpu_driver_version("Standard_NV6ads_A10_v5"), "grid-535.161.08");
        assert_eq!(gpu_image_sha("Standard_NV6ads_A10_v5"), "sha-7b2b12");
        assert_eq!(gpu_driver_type("standard_nc8ads_a10_v4_promo"), "grid");
    }

    #[test]
    fn cuda_sizes() {
        assert_eq!(gpu_driver_version("Standard_NC6s_v3"), "cuda-550.90.07");
        assert_eq!(gpu_driver_version("Standard_NC6"), "cuda-470.82.01");
        assert_eq!(gpu_image_sha("Standard_NC6s_v3"), "sha-b40b85");
        assert_eq!(gpu_driver_type("Standard_D2s_v3"), "cuda");
    }

    #[test]
    fn fabric_manager() {
        assert!(gpu_needs_fabric_manager("Standard_ND96asr_v4"));
        assert!(!gpu_needs_fabric_manager("Standard_NC24ads_A100_v4"));
    }
}
