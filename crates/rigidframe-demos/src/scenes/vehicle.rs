use rigidframe_core::{vec3, BodyId, ConstraintId, PhysicsError, Quat, StepListenerId};
use rigidframe_dynamics::{Activation, BodyCreationSettings, MotionType};
use rigidframe_geom::{BoxShapeSettings, ShapeSettings};
use rigidframe_render::PoseExtractor;
use rigidframe_runtime::{FrameInfo, SimulationContext};
use rigidframe_vehicles::{DriverInput, VehicleConstraint, VehicleConstraintSettings, WheelSettings, WheeledControllerSettings};
use rigidframe_world::World;

use super::{Demo, BLUE, GREY, ORANGE};
use crate::layers::{CHASSIS, NON_MOVING};

/// Steerable front wheel, driven rear pair, on a large flat slab.
pub struct VehicleDemo {
    pub ground: BodyId,
    pub chassis: BodyId,
    pub vehicle: ConstraintId,
    pub listener: StepListenerId,
    /// Applied before every step.
    pub input: DriverInput,
    /// Print the chassis position after each step.
    pub log_position: bool,
}

impl VehicleDemo {
    pub fn settings() -> VehicleConstraintSettings {
        VehicleConstraintSettings {
            wheels: vec![
                WheelSettings::at(vec3(0.0, -0.2, 1.6)).with_hand_brake_torque(0.0),
                WheelSettings::at(vec3(0.8, -0.2, -0.8)).with_max_steer_angle(0.0),
                WheelSettings::at(vec3(-0.8, -0.2, -0.8)).with_max_steer_angle(0.0),
            ],
            controller: WheeledControllerSettings { driven_wheels: vec![1, 2], ..Default::default() },
            ..Default::default()
        }
    }
}

impl Demo for VehicleDemo {
    const NAME: &'static str = "vehicle";

    fn build(ctx: &mut SimulationContext) -> Result<Self, PhysicsError> {
        let ground_shape = BoxShapeSettings::new(vec3(50.0, 0.5, 50.0)).create()?;
        let ground = ctx.create_and_add_body(
            &BodyCreationSettings::new(ground_shape, vec3(0.0, -0.5, 0.0), Quat::IDENTITY, MotionType::Static, NON_MOVING).with_friction(1.0),
            Activation::DontActivate,
        )?;

        let chassis_shape = BoxShapeSettings::new(vec3(0.9, 0.2, 2.0)).create()?;
        let chassis = ctx.create_body(
            &BodyCreationSettings::new(chassis_shape, vec3(0.0, 1.0, 0.0), Quat::IDENTITY, MotionType::Dynamic, CHASSIS).with_mass(1500.0),
        )?;
        ctx.add_body(chassis, Activation::Activate)?;

        let (vehicle, listener) = ctx.add_vehicle(&Self::settings(), chassis)?;
        ctx.world_mut().optimize_broad_phase()?;
        Ok(Self { ground, chassis, vehicle, listener, input: DriverInput::default(), log_position: false })
    }

    fn drawables(&self, world: &World, ex: &mut PoseExtractor) -> Result<(), PhysicsError> {
        ex.add_body(world, self.ground, "ground", GREY)?;
        ex.add_body(world, self.chassis, "chassis", ORANGE)?;
        ex.add_vehicle_wheels(world, self.vehicle, "wheel", BLUE)
    }

    fn keep_awake(&self) -> Vec<BodyId> { vec![self.chassis] }

    fn before_step(&mut self, world: &mut World, _frame: &FrameInfo) -> Result<(), PhysicsError> {
        world.constraint_mut::<VehicleConstraint>(self.vehicle)?.set_driver_input(self.input);
        Ok(())
    }

    fn after_step(&mut self, world: &World, frame: &FrameInfo) -> Result<(), PhysicsError> {
        if self.log_position {
            let p = world.world_transform(self.chassis)?.pos;
            println!("frame {:>6} t={:>8.3}  chassis=({:>8.3},{:>8.3},{:>8.3})", frame.frame, frame.time, p.x, p.y, p.z);
        }
        Ok(())
    }
}
