use super::RhiDeviceContextNull;
use crate::*;

/// Owns the headless device
pub struct RhiApiNull {
    device_context: RhiDeviceContextNull,
    destroyed: bool,
}

impl Drop for RhiApiNull {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            log::error!("Error destroying the headless device: {}", e);
        }
    }
}

impl RhiApiNull {
    pub fn new(api_def: &RhiApiDef) -> RhiResult<Self> {
        Ok(RhiApiNull {
            device_context: RhiDeviceContextNull::new(api_def)?,
            destroyed: false,
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
        &self.device_context
    }

    pub(crate) fn destroy(&mut self) -> RhiResult<()> {
        if self.destroyed {
            return Ok(());
        }

        // Whatever is still queued runs now so nothing is left holding resources
        if !self.device_context.is_device_lost() {
            self.device_context.wait_for_device_idle()?;
        }

        // Clear internal caches that hold objects created by the device
        self.device_context.sampler_cache().clear();

        let object_counts = self.device_context.object_counts();
        if object_counts.total() > 0 {
            log::warn!(
                "Destroying the headless device with live objects: {:?}",
                object_counts
            );
        }

        let strong_count = self.device_context.reference_count();
        if strong_count > 1 {
            Err(format!(
                "Could not destroy device, {} references to it exist",
                strong_count - 1
            ))?;
        }

        self.destroyed = true;
        log::info!("Destroyed headless device");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroy_can_be_retried_once_references_are_gone() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut api = RhiApiNull::new(&RhiApiDef::default()).unwrap();
        let device_context = api.device_context().clone();

        assert!(api.destroy().is_err());
        assert!(!api.destroyed);

        drop(device_context);
        api.destroy().unwrap();
        assert!(api.destroyed);
    }
}
