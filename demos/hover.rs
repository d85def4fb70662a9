//! Step the controller against a target that climbs and drifts sideways,
//! printing the motor commands each tick. Positions are scripted, not
//! simulated.
//!
//! Usage: cargo run --example hover

use quadcopter::custom_data::{CustomDataBuilder, DATA_ID};
use quadcopter::{Config, Field, MemoryScene, ObjectHandle, Quadcopter};

fn main() {
    env_logger::init();

    let mut scene = MemoryScene::new();
    let root = scene.add_object("Quadricopter", ObjectHandle::NONE);
    let body = scene.add_object("Quadricopter_base", root);
    let target = scene.add_object("Quadricopter_target", root);

    let tag = |f: Field| CustomDataBuilder::new().field(f).build();
    scene.set_custom_data(root, DATA_ID, tag(Field::Quadcopter));
    scene.set_custom_data(body, DATA_ID, tag(Field::Body));
    scene.set_custom_data(target, DATA_ID, tag(Field::Target));
    for field in Field::MOTORS {
        let m = scene.add_object("Quadricopter_propeller", body);
        scene.attach_script(m);
        scene.set_custom_data(m, DATA_ID, tag(field));
    }

    let mut quad = match Quadcopter::new(&scene, root, Config::from_env()) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Failed to assemble quadcopter: {}", e);
            std::process::exit(1);
        }
    };

    quad.simulation_started();
    for tick in 0..20 {
        let t = tick as f32 * 0.05;
        scene.set_time(t);
        scene.set_position(target, [0.1 * t, 0.0, 1.0 + 0.5 * t]);
        quad.simulation_stepped(&scene);

        let motors: Vec<f32> = (0..4)
            .map(|n| quad.motor_particle_velocity(&scene, n).unwrap_or(f32::NAN))
            .collect();
        println!(
            "t={:.2}  motors=[{:+.4}, {:+.4}, {:+.4}, {:+.4}]",
            t, motors[0], motors[1], motors[2], motors[3]
        );
    }
    quad.simulation_stopped();
}
