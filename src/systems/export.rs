// saves the arena layout as plain text
// by iterating through every live container and actor the host tracks

use bevy::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::systems::arena::ArenaConfig;
use crate::systems::arena::host::HostRegistry;
use crate::systems::arena::model::ArenaTransform;

// export event
#[derive(Event)]
pub struct ExportEvent {
    pub filename: String,
}

fn write_transform(writer: &mut impl Write, tag: &str, t: &ArenaTransform) -> io::Result<()> {
    let (l, r, s) = (t.location, t.rotation, t.scale);
    writeln!(
        writer,
        "{tag} {} {} {} {} {} {} {} {} {}",
        l.x, l.y, l.z, r.pitch, r.yaw, r.roll, s.x, s.y, s.z
    )
}

/// One line per placement, arena space:
/// `i x y z pitch yaw roll sx sy sz` for instances under their `c <label> <count>` header,
/// `a <class>` followed by the same fields for actors.
pub fn write_layout(writer: &mut impl Write, registry: &HostRegistry, seed: u64) -> io::Result<usize> {
    writeln!(writer, "# arena layout")?;
    writeln!(writer, "# seed {seed}")?;

    let mut lines = 0;
    for container in registry.live_containers() {
        writeln!(writer, "c {} {}", container.label.replace(' ', "_"), container.transforms.len())?;
        for transform in &container.transforms {
            write_transform(writer, "i", transform)?;
            lines += 1;
        }
    }
    for actor in registry.live_actors() {
        write_transform(writer, &format!("a {}", actor.class.replace(' ', "_")), &actor.transform)?;
        lines += 1;
    }

    writer.flush()?;
    Ok(lines)
}

// handle export events
pub fn handle_export(
    mut events: EventReader<ExportEvent>,
    registry: Res<HostRegistry>,
    config: Res<ArenaConfig>,
) {
    for event in events.read() {
        let result = File::create(&event.filename)
            .and_then(|file| write_layout(&mut BufWriter::new(file), &registry, config.settings.seed));
        match result {
            Ok(count) => info!("exported {count} placements to {}", event.filename),
            Err(e) => error!("export to {} failed: {e}", event.filename),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::arena::host::{ActorRecord, ContainerRecord};
    use crate::systems::arena::model::EulerAngles;

    #[test]
    fn layout_lists_instances_then_actors() {
        let mut registry = HostRegistry::default();
        registry.containers.push(Some(ContainerRecord {
            entity: Entity::PLACEHOLDER,
            label: "box Center".into(),
            mesh: Handle::default(),
            material: Handle::default(),
            transforms: vec![ArenaTransform::default(), ArenaTransform::default()],
        }));
        // destroyed containers are skipped
        registry.containers.push(None);
        registry.actors.push(Some(ActorRecord {
            entity: Entity::PLACEHOLDER,
            class: "Spawner".into(),
            transform: ArenaTransform {
                location: Vec3::new(1.0, 2.0, 3.0),
                rotation: EulerAngles::new(0.0, 90.0, 0.0),
                scale: Vec3::ONE,
            },
        }));

        let mut out = Vec::new();
        let count = write_layout(&mut out, &registry, 9).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(count, 3);
        assert_eq!(lines[1], "# seed 9");
        assert_eq!(lines[2], "c box_Center 2");
        assert_eq!(lines[3], "i 0 0 0 0 0 0 1 1 1");
        assert_eq!(lines[5], "a Spawner 1 2 3 0 90 0 1 1 1");
    }
}
