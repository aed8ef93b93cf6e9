use super::{RhiShaderEntryPoint, RhiShaderTarget};
use crate::reflection::{RhiBindingLayout, RhiShaderStageReflection};
use crate::{RhiError, RhiResult, RhiShaderStageFlags};
use std::path::PathBuf;

/// Compiled code for one stage
#[derive(Debug, Clone, PartialEq)]
pub enum RhiShaderBytecode {
    /// Consumed by Vulkan, and by OpenGL as a binary shader
    SpirV(Vec<u32>),
    /// Source handed to the D3D12 shader compiler for the given model
    Hlsl {
        source: String,
        entry_point: String,
        shader_model: String,
    },
}

impl RhiShaderBytecode {
    pub fn spirv(&self) -> Option<&[u32]> {
        match self {
            RhiShaderBytecode::SpirV(words) => Some(words),
            RhiShaderBytecode::Hlsl { .. } => None,
        }
    }

    pub fn target(&self) -> RhiShaderTarget {
        match self {
            RhiShaderBytecode::SpirV(_) => RhiShaderTarget::SpirV,
            RhiShaderBytecode::Hlsl { .. } => RhiShaderTarget::Hlsl,
        }
    }
}

/// One resolved entry point, compiled and reflected
#[derive(Debug, Clone, PartialEq)]
pub struct RhiShaderStageModule {
    pub stage: RhiShaderStageFlags,
    pub entry_point: String,
    pub bytecode: RhiShaderBytecode,
    pub reflection: RhiShaderStageReflection,
}

/// The outcome of compiling each requested entry point. Entry points the source does not define
/// have no module and are listed in `missing_entry_points`.
#[derive(Debug, Clone)]
pub struct RhiShaderModuleSet {
    pub name: String,
    pub target: RhiShaderTarget,
    pub stage_modules: Vec<RhiShaderStageModule>,
    pub missing_entry_points: Vec<RhiShaderEntryPoint>,
    pub source_files: Vec<PathBuf>,
}

impl RhiShaderModuleSet {
    pub fn stage_module(
        &self,
        stage: RhiShaderStageFlags,
    ) -> Option<&RhiShaderStageModule> {
        self.stage_modules.iter().find(|x| x.stage == stage)
    }

    /// Combine the stage modules into one program. Fails if any requested entry point was not
    /// found, or if the result is not a usable program.
    pub fn link(self) -> RhiResult<RhiShaderProgram> {
        if !self.missing_entry_points.is_empty() {
            let missing: Vec<_> = self
                .missing_entry_points
                .iter()
                .map(|x| format!("{} ({:?})", x.name, x.stage))
                .collect();
            let error = RhiError::ShaderLink {
                name: self.name.clone(),
                diagnostic: format!("entry points not found: {}", missing.join(", ")),
            };
            log::error!("{}", error);
            return Err(error);
        }

        let mut program = RhiShaderProgram::new(self.name, self.target, self.stage_modules)?;
        program.source_files_mut().extend(self.source_files);
        program.validate()?;
        Ok(program)
    }
}

/// A linked set of stages with the binding layout they share. This is what a device shader is
/// created from.
#[derive(Debug, Clone)]
pub struct RhiShaderProgram {
    name: String,
    target: RhiShaderTarget,
    stages: Vec<RhiShaderStageModule>,
    binding_layout: RhiBindingLayout,
    source_files: Vec<PathBuf>,
}

impl RhiShaderProgram {
    /// Builds the binding layout from the stages' reflection. Does not check that the stages form
    /// a usable program, see `validate`.
    pub fn new(
        name: String,
        target: RhiShaderTarget,
        stages: Vec<RhiShaderStageModule>,
    ) -> RhiResult<Self> {
        let reflection: Vec<_> = stages.iter().map(|x| x.reflection.clone()).collect();
        let binding_layout =
            RhiBindingLayout::from_stages(&reflection).map_err(|e| RhiError::ShaderLink {
                name: name.clone(),
                diagnostic: e.to_string(),
            })?;

        Ok(RhiShaderProgram {
            name,
            target,
            stages,
            binding_layout,
            source_files: Vec::default(),
        })
    }

    fn source_files_mut(&mut self) -> &mut Vec<PathBuf> {
        &mut self.source_files
    }

    /// A program needs at least one stage, and is either a compute program (a compute stage
    /// only) or a graphics program (a vertex stage, optionally with other graphics stages).
    pub fn validate(&self) -> RhiResult<()> {
        let link_error = |diagnostic: &str| {
            let error = RhiError::ShaderLink {
                name: self.name.clone(),
                diagnostic: diagnostic.to_string(),
            };
            log::error!("{}", error);
            Err(error)
        };

        if self.stages.is_empty() {
            return link_error("program has no stage modules");
        }

        let stages = self.shader_stages();
        if stages.contains(RhiShaderStageFlags::COMPUTE) {
            if stages != RhiShaderStageFlags::COMPUTE {
                return link_error("a compute stage cannot be linked with other stages");
            }
        } else if stages.intersects(RhiShaderStageFlags::ALL_GRAPHICS)
            && !stages.contains(RhiShaderStageFlags::VERTEX)
        {
            return link_error("a graphics program needs a vertex stage");
        }

        for stage in &self.stages {
            if stage.bytecode.target() != self.target {
                return link_error("stage modules were compiled for different targets");
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> RhiShaderTarget {
        self.target
    }

    pub fn stages(&self) -> &[RhiShaderStageModule] {
        &self.stages
    }

    pub fn stage(
        &self,
        stage: RhiShaderStageFlags,
    ) -> Option<&RhiShaderStageModule> {
        self.stages.iter().find(|x| x.stage == stage)
    }

    pub fn shader_stages(&self) -> RhiShaderStageFlags {
        self.binding_layout.shader_stages
    }

    pub fn binding_layout(&self) -> &RhiBindingLayout {
        &self.binding_layout
    }

    pub fn source_files(&self) -> &[PathBuf] {
        &self.source_files
    }

    pub fn is_compute(&self) -> bool {
        self.shader_stages().contains(RhiShaderStageFlags::COMPUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_module(stage: RhiShaderStageFlags) -> RhiShaderStageModule {
        RhiShaderStageModule {
            stage,
            entry_point: "main".to_string(),
            bytecode: RhiShaderBytecode::SpirV(vec![]),
            reflection: RhiShaderStageReflection {
                shader_stage: stage,
                entry_point_name: "main".to_string(),
                resources: vec![],
                push_constant_size: 0,
                thread_count: [0; 3],
            },
        }
    }

    #[test]
    fn zero_stage_program_fails_validation() {
        let program =
            RhiShaderProgram::new("empty".to_string(), RhiShaderTarget::SpirV, vec![]).unwrap();
        match program.validate() {
            Err(RhiError::ShaderLink { name, .. }) => assert_eq!(name, "empty"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn graphics_program_needs_vertex_stage() {
        let program = RhiShaderProgram::new(
            "fragment_only".to_string(),
            RhiShaderTarget::SpirV,
            vec![stage_module(RhiShaderStageFlags::FRAGMENT)],
        )
        .unwrap();
        assert!(program.validate().is_err());

        let program = RhiShaderProgram::new(
            "mixed".to_string(),
            RhiShaderTarget::SpirV,
            vec![
                stage_module(RhiShaderStageFlags::VERTEX),
                stage_module(RhiShaderStageFlags::COMPUTE),
            ],
        )
        .unwrap();
        assert!(program.validate().is_err());
    }

    #[test]
    fn link_fails_on_missing_entry_point() {
        let module_set = RhiShaderModuleSet {
            name: "partial".to_string(),
            target: RhiShaderTarget::SpirV,
            stage_modules: vec![stage_module(RhiShaderStageFlags::VERTEX)],
            missing_entry_points: vec![RhiShaderEntryPoint::new(
                RhiShaderStageFlags::FRAGMENT,
                "fs_main",
            )],
            source_files: vec![],
        };
        assert!(module_set.stage_module(RhiShaderStageFlags::FRAGMENT).is_none());
        assert!(matches!(
            module_set.link(),
            Err(RhiError::ShaderLink { .. })
        ));
    }
}
