use crate::runtime::animation::MixBlend;
use crate::runtime::constraint::Constraint;
use crate::runtime::skeleton::Skeleton;
use crate::SliderConstraintData;
use std::sync::Arc;

impl Skeleton {
    /// Poses the slider's animation at a time read from its driver bone, or at the pose time.
    pub(crate) fn update_slider(&mut self, index: usize, data: &SliderConstraintData) {
        let Some(Constraint::Slider(slider)) = self.constraints.get(index) else {
            return;
        };
        let pose = *slider.posed.applied();
        if pose.mix == 0.0 {
            return;
        }
        let skeleton_data = Arc::clone(&self.data);
        let Some(animation) = skeleton_data.animations.get(data.animation) else {
            return;
        };

        let mut time = pose.time;
        if let Some(driver) = &data.driver {
            if !self.bones[driver.bone].active {
                return;
            }
            if driver.local {
                self.validate_local(driver.bone);
            }
            let value = self.property_value(driver.bone, driver.property, driver.local, &[0.0; 6])
                - driver.property_offset;
            time = driver.offset + value * driver.scale;
            if data.looped {
                if animation.duration > 0.0 {
                    time = animation.duration + time % animation.duration;
                } else {
                    log::warn!(
                        "slider '{}' loops animation '{}' with zero duration",
                        data.name,
                        animation.name
                    );
                }
            } else {
                time = time.max(0.0);
            }
            if let Some(Constraint::Slider(slider)) = self.constraints.get_mut(index) {
                slider.posed.applied_mut().time = time;
            }
        }

        for &bone in animation.bones() {
            self.modify_local(bone);
        }
        let blend = if data.additive {
            MixBlend::Add
        } else {
            MixBlend::Replace
        };
        animation.apply_applied(self, time, data.looped, pose.mix, blend);
    }
}
