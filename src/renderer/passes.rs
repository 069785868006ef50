//! Frame pass plan shared by the GPU renderer and the software reference renderer.

use super::DEPTH_FORMAT;

/// Stencil value window panes stamp into the mask.
pub const WINDOW_STENCIL_REF: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePass {
    /// Color, depth (1.0) and stencil (0) cleared.
    Clear,
    /// Whole room drawn normally.
    Scene,
    /// Window-pane duplicates stamp the stencil only.
    WindowMask,
    /// Full-screen sky quad where the stencil equals the window reference.
    Sky,
    /// Hover outlines drawn after the main frame with default state restored.
    Outline,
}

/// Order of the main frame. Defaults are restored after [`FramePass::Sky`].
pub const MAIN_FRAME: [FramePass; 4] =
    [FramePass::Clear, FramePass::Scene, FramePass::WindowMask, FramePass::Sky];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilMode {
    Disabled,
    /// Always passes and replaces the stored value with `reference`, write mask 0xff.
    Stamp { reference: u32 },
    /// Passes where the stored value equals `reference`, writes nothing.
    Equal { reference: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    pub color_write: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub stencil: StencilMode,
    pub cull: CullMode,
}

impl PassState {
    /// Depth test on, depth write on, stencil off, color on.
    pub const DEFAULT: PassState = PassState {
        color_write: true,
        depth_test: true,
        depth_write: true,
        stencil: StencilMode::Disabled,
        cull: CullMode::Back,
    };

    pub fn for_pass(pass: FramePass) -> PassState {
        match pass {
            FramePass::Clear | FramePass::Scene => PassState::DEFAULT,
            FramePass::WindowMask => PassState {
                color_write: false,
                depth_test: true,
                depth_write: false,
                stencil: StencilMode::Stamp { reference: WINDOW_STENCIL_REF },
                cull: CullMode::Back,
            },
            FramePass::Sky => PassState {
                color_write: true,
                depth_test: false,
                depth_write: false,
                stencil: StencilMode::Equal { reference: WINDOW_STENCIL_REF },
                cull: CullMode::None,
            },
            FramePass::Outline => {
                PassState { depth_write: false, cull: CullMode::Front, ..PassState::DEFAULT }
            }
        }
    }

    pub fn stencil_reference(&self) -> u32 {
        match self.stencil {
            StencilMode::Disabled => 0,
            StencilMode::Stamp { reference } | StencilMode::Equal { reference } => reference,
        }
    }

    pub fn depth_stencil_state(&self) -> wgpu::DepthStencilState {
        let stencil = match self.stencil {
            StencilMode::Disabled => wgpu::StencilState::default(),
            StencilMode::Stamp { .. } => {
                let face = wgpu::StencilFaceState {
                    compare: wgpu::CompareFunction::Always,
                    fail_op: wgpu::StencilOperation::Keep,
                    depth_fail_op: wgpu::StencilOperation::Keep,
                    pass_op: wgpu::StencilOperation::Replace,
                };
                wgpu::StencilState { front: face, back: face, read_mask: 0xff, write_mask: 0xff }
            }
            StencilMode::Equal { .. } => {
                let face = wgpu::StencilFaceState {
                    compare: wgpu::CompareFunction::Equal,
                    fail_op: wgpu::StencilOperation::Keep,
                    depth_fail_op: wgpu::StencilOperation::Keep,
                    pass_op: wgpu::StencilOperation::Keep,
                };
                wgpu::StencilState { front: face, back: face, read_mask: 0xff, write_mask: 0x00 }
            }
        };
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare: if self.depth_test {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            },
            stencil,
            bias: wgpu::DepthBiasState::default(),
        }
    }

    pub fn color_writes(&self) -> wgpu::ColorWrites {
        if self.color_write {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        }
    }

    pub fn cull_face(&self) -> Option<wgpu::Face> {
        match self.cull {
            CullMode::None => None,
            CullMode::Back => Some(wgpu::Face::Back),
            CullMode::Front => Some(wgpu::Face::Front),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_pass_writes_stencil_only() {
        let state = PassState::for_pass(FramePass::WindowMask);
        assert!(!state.color_write);
        assert!(!state.depth_write);
        let ds = state.depth_stencil_state();
        assert_eq!(ds.stencil.write_mask, 0xff);
        assert_eq!(ds.stencil.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.color_writes(), wgpu::ColorWrites::empty());
        assert_eq!(state.cull_face(), Some(wgpu::Face::Back));
    }

    #[test]
    fn sky_pass_ignores_depth_and_tests_stencil() {
        let state = PassState::for_pass(FramePass::Sky);
        let ds = state.depth_stencil_state();
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
        assert!(!ds.depth_write_enabled);
        assert_eq!(ds.stencil.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(ds.stencil.write_mask, 0);
        assert_eq!(state.stencil_reference(), WINDOW_STENCIL_REF);
    }

    #[test]
    fn outline_pass_runs_on_restored_defaults() {
        let state = PassState::for_pass(FramePass::Outline);
        assert!(state.depth_test);
        assert_eq!(state.stencil, StencilMode::Disabled);
        assert_eq!(state.cull, CullMode::Front);
        assert_eq!(MAIN_FRAME.last(), Some(&FramePass::Sky));
    }
}
