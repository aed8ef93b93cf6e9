use crate::*;
use ash::extensions::khr;
use ash::vk;
use std::ffi::CStr;

/// Queue families the device uses. The graphics family also handles compute and transfer work.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(in crate::backends::vulkan) struct VkQueueFamilyIndices {
    pub graphics: u32,
    /// Only set when a surface was given. May equal `graphics`.
    pub present: Option<u32>,
}

pub(in crate::backends::vulkan) struct VkPhysicalDeviceChoice {
    pub physical_device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub queue_family_indices: VkQueueFamilyIndices,
    pub supports_sampler_anisotropy: bool,
}

/// A surface to check presentation support against
pub(in crate::backends::vulkan) struct VkSurfaceProbe<'a> {
    pub surface_loader: &'a khr::Surface,
    pub surface: vk::SurfaceKHR,
}

/// Pick the best adapter that can run the device. Discrete GPUs win over integrated ones.
pub(in crate::backends::vulkan) fn choose_physical_device(
    instance: &ash::Instance,
    surface: Option<&VkSurfaceProbe>,
) -> RhiResult<VkPhysicalDeviceChoice> {
    let physical_devices = unsafe { instance.enumerate_physical_devices()? };
    if physical_devices.is_empty() {
        return Err("no vulkan physical devices were found")?;
    }

    let mut best: Option<(u32, VkPhysicalDeviceChoice)> = None;
    for physical_device in physical_devices {
        let candidate = query_physical_device(instance, physical_device, surface)?;
        let device_name = device_name(&candidate.0.properties);
        match candidate {
            (choice, Some(score)) => {
                log::info!(
                    "Found suitable device {:?} ({:?}), score {}",
                    device_name,
                    choice.properties.device_type,
                    score
                );
                if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                    best = Some((score, choice));
                }
            }
            (_, None) => log::info!("Device {:?} is not suitable", device_name),
        }
    }

    let (_, choice) = best.ok_or("no vulkan device supports the features the renderer needs")?;
    log::info!("Selected device {:?}", device_name(&choice.properties));
    Ok(choice)
}

pub(in crate::backends::vulkan) fn device_name(
    properties: &vk::PhysicalDeviceProperties,
) -> String {
    unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Returns the device and its score, or no score if it cannot be used
fn query_physical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    surface: Option<&VkSurfaceProbe>,
) -> RhiResult<(VkPhysicalDeviceChoice, Option<u32>)> {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };

    let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
    let mut features2 = vk::PhysicalDeviceFeatures2::builder()
        .push_next(&mut features13)
        .build();
    unsafe { instance.get_physical_device_features2(physical_device, &mut features2) };
    let supports_sampler_anisotropy = features2.features.sampler_anisotropy == vk::TRUE;
    let supports_dynamic_rendering = features13.dynamic_rendering == vk::TRUE;

    let queue_families =
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
    let graphics_family = queue_families
        .iter()
        .position(|x| x.queue_flags.contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE))
        .map(|x| x as u32);

    let mut present_family = None;
    if let Some(probe) = surface {
        // Prefer presenting from the graphics family, it avoids concurrent sharing
        let mut supporting_families = vec![];
        for family_index in 0..queue_families.len() as u32 {
            let supported = unsafe {
                probe.surface_loader.get_physical_device_surface_support(
                    physical_device,
                    family_index,
                    probe.surface,
                )?
            };
            if supported {
                supporting_families.push(family_index);
            }
        }

        present_family = match graphics_family {
            Some(graphics) if supporting_families.contains(&graphics) => Some(graphics),
            _ => supporting_families.first().copied(),
        };
    }

    let extensions = unsafe { instance.enumerate_device_extension_properties(physical_device)? };
    let supports_swapchain = extensions.iter().any(|extension| {
        unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) } == khr::Swapchain::name()
    });

    let graphics = graphics_family.unwrap_or(0);
    let choice = VkPhysicalDeviceChoice {
        physical_device,
        properties,
        queue_family_indices: VkQueueFamilyIndices {
            graphics,
            present: present_family,
        },
        supports_sampler_anisotropy,
    };

    let suitable = properties.api_version >= vk::make_api_version(0, 1, 3, 0)
        && supports_dynamic_rendering
        && graphics_family.is_some()
        && (surface.is_none() || (present_family.is_some() && supports_swapchain));
    if !suitable {
        return Ok((choice, None));
    }

    let mut score = match properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 1000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 10,
        _ => 1,
    };

    if present_family == Some(graphics) {
        score += 50;
    }

    Ok((choice, Some(score)))
}
