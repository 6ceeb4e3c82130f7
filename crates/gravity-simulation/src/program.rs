//! Descriptions of the WGSL programs the session consumes

/// A vertex-stage or storage attribute consumed by a program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    /// Number of f32 components per element
    pub components: u32,
}

/// Interface of one WGSL program.
///
/// `validate` checks that the source really declares every name listed here,
/// so a shader edit that drops or renames an input fails loudly at startup
/// instead of producing an empty frame.
#[derive(Clone, Copy, Debug)]
pub struct ProgramDescriptor {
    pub label: &'static str,
    pub source: &'static str,
    pub entry_points: &'static [&'static str],
    pub attributes: &'static [Attribute],
    pub uniforms: &'static [&'static str],
    /// Outputs captured by the feedback pass (update program only)
    pub feedback_outputs: &'static [&'static str],
    /// Name of the read-only mass uniform block, if the program uses it
    pub uniform_block: Option<&'static str>,
}

/// Name of the uniform block holding the packed masses
pub const MASS_BLOCK_NAME: &str = "Masses";

/// Workgroup size of the update kernel. Must match `@workgroup_size` in `update.wgsl`.
pub const WORKGROUP_SIZE: u32 = 256;

pub const UPDATE_PROGRAM: ProgramDescriptor = ProgramDescriptor {
    label: "Particle Update Shader",
    source: include_str!("shaders/update.wgsl"),
    entry_points: &["main"],
    attributes: &[
        Attribute {
            name: "src_position",
            components: 3,
        },
        Attribute {
            name: "src_color",
            components: 3,
        },
        Attribute {
            name: "src_velocity",
            components: 3,
        },
    ],
    uniforms: &["params", "masses"],
    feedback_outputs: &["dst_position", "dst_velocity"],
    uniform_block: Some(MASS_BLOCK_NAME),
};

impl ProgramDescriptor {
    /// Names listed in the descriptor that the source does not mention
    pub fn missing_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        names.extend(self.entry_points.iter().copied());
        names.extend(self.attributes.iter().map(|a| a.name));
        names.extend(self.uniforms.iter().copied());
        names.extend(self.feedback_outputs.iter().copied());
        names.extend(self.uniform_block);

        names
            .into_iter()
            .filter(|name| !self.source.contains(name))
            .collect()
    }

    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let missing = self.missing_names();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        if let Err(missing) = self.validate() {
            log::warn!("{} does not declare {:?}", self.label, missing);
        }
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(self.source.into()),
        })
    }
}
