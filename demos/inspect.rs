//! Build a tagged scene in memory and print what discovery resolves.
//!
//! Usage: RUST_LOG=info cargo run --example inspect

use quadcopter::custom_data::{self, CustomDataBuilder, DATA_ID};
use quadcopter::{Config, Field, MemoryScene, ObjectHandle, Quadcopter, Scene};

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
    // Only three propellers are tagged; motor #4 stays unresolved.
    for field in &Field::MOTORS[..3] {
        let m = scene.add_object("Quadricopter_propeller", body);
        scene.set_custom_data(m, DATA_ID, tag(*field));
    }

    let mut obj = ObjectHandle(0);
    while obj.0 < 32 {
        let len = scene.custom_data_len(obj, DATA_ID);
        if len > 0 {
            let block = scene.custom_data(obj, DATA_ID, len as usize).unwrap_or_default();
            match custom_data::decode(&block) {
                Ok(fields) => {
                    let roles: Vec<_> = fields.keys().filter_map(|id| Field::from_id(*id)).collect();
                    println!("{:>3} {:<24} {:?}", obj.0, scene.object_name(obj).unwrap_or_default(), roles);
                }
                Err(e) => println!("{:>3} bad custom data: {}", obj.0, e),
            }
        }
        obj.0 += 1;
    }

    match Quadcopter::new(&scene, root, Config::from_env()) {
        Ok(quad) => println!("resolved: {:?}", quad.resolved()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
