use super::*;

use winapi::shared::minwindef::{FALSE, TRUE};

pub struct SRootSignature {
    raw: ComPtr<ID3D12RootSignature>,
}

impl SRootSignature {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12RootSignature>) -> Self {
        Self { raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12RootSignature> {
        &self.raw
    }
}

pub struct SPipelineState {
    pipelinestate: ComPtr<ID3D12PipelineState>,
}

impl SPipelineState {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12PipelineState>) -> Self {
        Self { pipelinestate: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12PipelineState> {
        &self.pipelinestate
    }
}

fn shaderbytecode(bytecode: &[u8]) -> D3D12_SHADER_BYTECODE {
    D3D12_SHADER_BYTECODE {
        pShaderBytecode: bytecode.as_ptr() as *const c_void,
        BytecodeLength: bytecode.len(),
    }
}

fn rendertargetblenddesc(blend_mode: t12::EBlendMode) -> D3D12_RENDER_TARGET_BLEND_DESC {
    // -- (blend enable, src, dest, op)
    let (enable, src, dest, op) = match blend_mode {
        t12::EBlendMode::None => (FALSE, D3D12_BLEND_ONE, D3D12_BLEND_ZERO, D3D12_BLEND_OP_ADD),
        t12::EBlendMode::Normal => (
            TRUE,
            D3D12_BLEND_SRC_ALPHA,
            D3D12_BLEND_INV_SRC_ALPHA,
            D3D12_BLEND_OP_ADD,
        ),
        t12::EBlendMode::Add => (TRUE, D3D12_BLEND_SRC_ALPHA, D3D12_BLEND_ONE, D3D12_BLEND_OP_ADD),
        t12::EBlendMode::Subtract => (
            TRUE,
            D3D12_BLEND_SRC_ALPHA,
            D3D12_BLEND_ONE,
            D3D12_BLEND_OP_REV_SUBTRACT,
        ),
        t12::EBlendMode::Multiply => (TRUE, D3D12_BLEND_ZERO, D3D12_BLEND_SRC_COLOR, D3D12_BLEND_OP_ADD),
        t12::EBlendMode::Screen => (
            TRUE,
            D3D12_BLEND_INV_DEST_COLOR,
            D3D12_BLEND_ONE,
            D3D12_BLEND_OP_ADD,
        ),
    };

    D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: enable,
        LogicOpEnable: FALSE,
        SrcBlend: src,
        DestBlend: dest,
        BlendOp: op,
        SrcBlendAlpha: D3D12_BLEND_ONE,
        DestBlendAlpha: D3D12_BLEND_ZERO,
        BlendOpAlpha: D3D12_BLEND_OP_ADD,
        LogicOp: D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL as u8,
    }
}

// -- the returned desc points into `desc` and into the returned element array, keep both
// -- alive until the pipeline state is created
pub(super) fn graphicspipelinestatedesc(
    desc: &t12::SGraphicsPipelineStateDesc<'_, SWindowsBackend>,
) -> (D3D12_GRAPHICS_PIPELINE_STATE_DESC, Vec<D3D12_INPUT_ELEMENT_DESC>) {
    let input_elements: Vec<D3D12_INPUT_ELEMENT_DESC> = desc
        .input_layout
        .iter()
        .map(|element| D3D12_INPUT_ELEMENT_DESC {
            SemanticName: element.semantic_name.as_ptr(),
            SemanticIndex: element.semantic_index,
            Format: formatd3dtype(element.format),
            InputSlot: element.input_slot,
            AlignedByteOffset: element.aligned_byte_offset,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        })
        .collect();

    let mut d3ddesc: D3D12_GRAPHICS_PIPELINE_STATE_DESC = unsafe { mem::zeroed() };

    d3ddesc.pRootSignature = unsafe { desc.root_signature.raw().as_raw() };
    d3ddesc.VS = shaderbytecode(desc.vertex_shader);
    d3ddesc.PS = shaderbytecode(desc.pixel_shader);

    let rtblend = rendertargetblenddesc(desc.blend_mode);
    for rt in d3ddesc.BlendState.RenderTarget.iter_mut() {
        *rt = rtblend;
    }
    d3ddesc.BlendState.AlphaToCoverageEnable = FALSE;
    d3ddesc.BlendState.IndependentBlendEnable = FALSE;
    d3ddesc.SampleMask = u32::max_value();

    d3ddesc.RasterizerState = D3D12_RASTERIZER_DESC {
        FillMode: D3D12_FILL_MODE_SOLID,
        CullMode: match desc.cull_mode {
            t12::ECullMode::None => D3D12_CULL_MODE_NONE,
            t12::ECullMode::Front => D3D12_CULL_MODE_FRONT,
            t12::ECullMode::Back => D3D12_CULL_MODE_BACK,
        },
        FrontCounterClockwise: FALSE,
        DepthBias: D3D12_DEFAULT_DEPTH_BIAS as i32,
        DepthBiasClamp: D3D12_DEFAULT_DEPTH_BIAS_CLAMP,
        SlopeScaledDepthBias: D3D12_DEFAULT_SLOPE_SCALED_DEPTH_BIAS,
        DepthClipEnable: TRUE,
        MultisampleEnable: FALSE,
        AntialiasedLineEnable: FALSE,
        ForcedSampleCount: 0,
        ConservativeRaster: D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
    };

    let stencilop = D3D12_DEPTH_STENCILOP_DESC {
        StencilFailOp: D3D12_STENCIL_OP_KEEP,
        StencilDepthFailOp: D3D12_STENCIL_OP_KEEP,
        StencilPassOp: D3D12_STENCIL_OP_KEEP,
        StencilFunc: D3D12_COMPARISON_FUNC_ALWAYS,
    };
    d3ddesc.DepthStencilState = D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: if desc.depth_enable { TRUE } else { FALSE },
        DepthWriteMask: if desc.depth_enable {
            D3D12_DEPTH_WRITE_MASK_ALL
        } else {
            D3D12_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: D3D12_COMPARISON_FUNC_LESS,
        StencilEnable: FALSE,
        StencilReadMask: D3D12_DEFAULT_STENCIL_READ_MASK as u8,
        StencilWriteMask: D3D12_DEFAULT_STENCIL_WRITE_MASK as u8,
        FrontFace: stencilop,
        BackFace: stencilop,
    };

    d3ddesc.InputLayout = D3D12_INPUT_LAYOUT_DESC {
        pInputElementDescs: input_elements.as_ptr(),
        NumElements: input_elements.len() as u32,
    };
    d3ddesc.PrimitiveTopologyType = D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE;
    d3ddesc.NumRenderTargets = 1;
    d3ddesc.RTVFormats[0] = formatd3dtype(desc.rtv_format);
    d3ddesc.DSVFormat = formatd3dtype(desc.dsv_format.unwrap_or(t12::EDXGIFormat::Unknown));
    d3ddesc.SampleDesc = sampledescd3dtype();

    (d3ddesc, input_elements)
}
