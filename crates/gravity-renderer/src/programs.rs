//! Render programs

use gravity_simulation::{Attribute, ProgramDescriptor};

pub const PARTICLE_PROGRAM: ProgramDescriptor = ProgramDescriptor {
    label: "Particle Shader",
    source: include_str!("shaders/particle.wgsl"),
    entry_points: &["vertex", "fragment"],
    attributes: &[
        Attribute {
            name: "positions",
            components: 3,
        },
        Attribute {
            name: "colors",
            components: 3,
        },
    ],
    uniforms: &["view"],
    feedback_outputs: &[],
    uniform_block: None,
};

pub const MASS_MARKER_PROGRAM: ProgramDescriptor = ProgramDescriptor {
    label: "Mass Marker Shader",
    source: include_str!("shaders/mass.wgsl"),
    entry_points: &["vs_marker", "fs_marker"],
    attributes: &[Attribute {
        name: "mass",
        components: 4,
    }],
    uniforms: &["view"],
    feedback_outputs: &[],
    uniform_block: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).unwrap();
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap();
        module
    }

    #[test]
    fn render_programs_declare_their_interface() {
        assert_eq!(PARTICLE_PROGRAM.validate(), Ok(()));
        assert_eq!(MASS_MARKER_PROGRAM.validate(), Ok(()));
    }

    #[test]
    fn render_programs_are_valid_wgsl() {
        for program in [PARTICLE_PROGRAM, MASS_MARKER_PROGRAM] {
            let module = validate_wgsl(program.source);
            for entry in program.entry_points {
                assert!(
                    module.entry_points.iter().any(|ep| ep.name == *entry),
                    "{} has no entry point {}",
                    program.label,
                    entry
                );
            }
        }
    }
}
