//! Tag vocabularies used to describe where inside an API call a diagnostic
//! applies.
//!
//! The enums mirror registry spellings exactly, so that rendered paths read
//! like the call they describe (`vkCreateBuffer(): pCreateInfo.size`). They
//! cover the entry points and structures referenced by the built-in tables and
//! tests; extending them is a matter of adding lines to the lists below.

use crate::macros::vulkan_tags;

vulkan_tags! {
    /// One API entry point, as spelled in the registry.
    Func;

    vkCreateInstance,
    vkDestroyInstance,
    vkCreateDevice,
    vkGetDeviceQueue,
    vkAllocateMemory,
    vkBindBufferMemory,
    vkBindBufferMemory2,
    vkBindBufferMemory2KHR,
    vkBindImageMemory2,
    vkBindImageMemory2KHR,
    vkCreateBuffer,
    vkCreateBufferView,
    vkCreateImage,
    vkCreateImageView,
    vkCreateSampler,
    vkCreateRenderPass,
    vkCreateRenderPass2,
    vkCreateRenderPass2KHR,
    vkCreateFramebuffer,
    vkCreateGraphicsPipelines,
    vkCreateComputePipelines,
    vkCreatePipelineCache,
    vkAllocateDescriptorSets,
    vkUpdateDescriptorSets,
    vkBeginCommandBuffer,
    vkCmdDraw,
    vkCmdDrawIndexed,
    vkCmdDispatch,
    vkCmdCopyBuffer,
    vkCmdCopyBuffer2,
    vkCmdCopyBuffer2KHR,
    vkCmdPipelineBarrier,
    vkCmdPipelineBarrier2,
    vkCmdPipelineBarrier2KHR,
    vkQueueSubmit,
    vkQueueSubmit2,
    vkQueueSubmit2KHR,
    vkQueuePresentKHR,
    vkCreateSwapchainKHR,
    vkAcquireNextImageKHR,
    vkSetDebugUtilsObjectNameEXT,
    vkDebugMarkerSetObjectNameEXT,
    vkQueueBeginDebugUtilsLabelEXT,
    vkQueueEndDebugUtilsLabelEXT,
    vkQueueInsertDebugUtilsLabelEXT,
    vkCmdBeginDebugUtilsLabelEXT,
    vkCmdEndDebugUtilsLabelEXT,
    vkCmdInsertDebugUtilsLabelEXT,
    vkCreateDebugUtilsMessengerEXT,
    vkDestroyDebugUtilsMessengerEXT,
}

vulkan_tags! {
    /// One structure type, as spelled in the registry.
    Struct;

    VkApplicationInfo,
    VkInstanceCreateInfo,
    VkDeviceCreateInfo,
    VkDeviceQueueCreateInfo,
    VkMemoryAllocateInfo,
    VkMemoryDedicatedAllocateInfo,
    VkBindBufferMemoryInfo,
    VkBindImageMemoryInfo,
    VkBufferCreateInfo,
    VkBufferViewCreateInfo,
    VkExternalMemoryBufferCreateInfo,
    VkImageCreateInfo,
    VkImageViewCreateInfo,
    VkSamplerCreateInfo,
    VkRenderPassCreateInfo,
    VkRenderPassCreateInfo2,
    VkSubpassDescription2,
    VkFramebufferCreateInfo,
    VkGraphicsPipelineCreateInfo,
    VkComputePipelineCreateInfo,
    VkPipelineShaderStageCreateInfo,
    VkPipelineRenderingCreateInfo,
    VkDescriptorSetAllocateInfo,
    VkWriteDescriptorSet,
    VkCommandBufferBeginInfo,
    VkSubmitInfo,
    VkSubmitInfo2,
    VkCommandBufferSubmitInfo,
    VkDependencyInfo,
    VkBufferMemoryBarrier2,
    VkImageMemoryBarrier2,
    VkSwapchainCreateInfoKHR,
    VkPresentInfoKHR,
    VkDebugUtilsObjectNameInfoEXT,
    VkDebugUtilsLabelEXT,
    VkDebugUtilsMessengerCreateInfoEXT,
}

vulkan_tags! {
    /// One parameter or structure member, as spelled in the registry.
    Field;

    pNext,
    pApplicationInfo,
    pApplicationName,
    pEngineName,
    ppEnabledLayerNames,
    ppEnabledExtensionNames,
    pCreateInfo,
    pCreateInfos,
    pAllocateInfo,
    pAllocator,
    pQueueCreateInfos,
    queueFamilyIndex,
    queueCount,
    pQueuePriorities,
    allocationSize,
    memoryTypeIndex,
    memory,
    memoryOffset,
    buffer,
    image,
    flags,
    size,
    usage,
    sharingMode,
    queueFamilyIndexCount,
    pQueueFamilyIndices,
    format,
    extent,
    width,
    height,
    depth,
    mipLevels,
    arrayLayers,
    samples,
    tiling,
    subresourceRange,
    baseMipLevel,
    levelCount,
    baseArrayLayer,
    layerCount,
    attachmentCount,
    pAttachments,
    pSubpasses,
    pColorAttachments,
    pDepthStencilAttachment,
    stageCount,
    pStages,
    stage,
    module,
    pName,
    layout,
    renderPass,
    subpass,
    pSetLayouts,
    descriptorPool,
    descriptorSetCount,
    pDescriptorWrites,
    dstSet,
    dstBinding,
    dstArrayElement,
    descriptorCount,
    descriptorType,
    pBufferInfo,
    pImageInfo,
    pTexelBufferView,
    pInheritanceInfo,
    pBindInfos,
    pSubmits,
    pCommandBuffers,
    pCommandBufferInfos,
    commandBuffer,
    pWaitSemaphores,
    pSignalSemaphores,
    pWaitSemaphoreInfos,
    pSignalSemaphoreInfos,
    semaphore,
    pMemoryBarriers,
    pBufferMemoryBarriers,
    pImageMemoryBarriers,
    pDependencyInfo,
    srcStageMask,
    dstStageMask,
    srcAccessMask,
    dstAccessMask,
    srcQueueFamilyIndex,
    dstQueueFamilyIndex,
    oldLayout,
    newLayout,
    offset,
    pRegions,
    srcBuffer,
    dstBuffer,
    srcOffset,
    dstOffset,
    minImageCount,
    imageFormat,
    imageExtent,
    presentMode,
    surface,
    swapchainCount,
    pSwapchains,
    pImageIndices,
    pLabelName,
    color,
    pObjectName,
    objectType,
    objectHandle,
    pLabelInfo,
    pNameInfo,
    messageSeverity,
    messageType,
    pfnUserCallback,
    pUserData,
}

impl Func {
    /// Maps a promoted core entry point to the extension-suffixed tag its
    /// lookup tables were authored under.
    ///
    /// Tags without an alias map to themselves, so this is safe to apply
    /// unconditionally before a table lookup.
    #[inline]
    pub const fn resolve_alias(self) -> Func {
        match self {
            Func::vkBindBufferMemory2 => Func::vkBindBufferMemory2KHR,
            Func::vkBindImageMemory2 => Func::vkBindImageMemory2KHR,
            Func::vkCreateRenderPass2 => Func::vkCreateRenderPass2KHR,
            Func::vkCmdCopyBuffer2 => Func::vkCmdCopyBuffer2KHR,
            Func::vkCmdPipelineBarrier2 => Func::vkCmdPipelineBarrier2KHR,
            Func::vkQueueSubmit2 => Func::vkQueueSubmit2KHR,
            _ => self,
        }
    }
}

impl Field {
    /// Returns whether the tag names a pointer-typed member, following the
    /// registry's `p`/`pp` prefix convention. Path rendering joins a
    /// pointer-typed segment to its child with `->` instead of `.`.
    #[inline]
    pub const fn is_pointer(self) -> bool {
        let name = self.as_str().as_bytes();

        if name.len() >= 2 && name[0] == b'p' {
            if name[1].is_ascii_uppercase() {
                return true;
            }

            if name[1] == b'p' && name.len() >= 3 && name[2].is_ascii_uppercase() {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, Func, Struct};

    #[test]
    fn registry_spellings() {
        assert_eq!(Func::vkCmdDraw.as_str(), "vkCmdDraw");
        assert_eq!(Struct::VkBufferCreateInfo.as_str(), "VkBufferCreateInfo");
        assert_eq!(Field::pQueueFamilyIndices.as_str(), "pQueueFamilyIndices");
        assert_eq!(Func::Empty.as_str(), "");
        assert_eq!(Struct::Empty.as_str(), "");
        assert_eq!(Field::Empty.as_str(), "");
    }

    #[test]
    fn empty_is_default_and_smallest() {
        assert_eq!(Func::default(), Func::Empty);
        assert_eq!(Struct::default(), Struct::Empty);
        assert_eq!(Field::default(), Field::Empty);
        assert!(Func::Empty < Func::vkCreateInstance);
        assert!(Field::Empty < Field::pNext);
    }

    #[test]
    fn pointer_field_prefixes() {
        assert!(Field::pNext.is_pointer());
        assert!(Field::pCreateInfo.is_pointer());
        assert!(Field::ppEnabledExtensionNames.is_pointer());
        assert!(!Field::flags.is_pointer());
        assert!(!Field::presentMode.is_pointer());
        assert!(!Field::pfnUserCallback.is_pointer());
        assert!(!Field::Empty.is_pointer());
    }

    #[test]
    fn alias_resolution() {
        assert_eq!(
            Func::vkQueueSubmit2.resolve_alias(),
            Func::vkQueueSubmit2KHR,
        );
        assert_eq!(
            Func::vkCmdPipelineBarrier2.resolve_alias(),
            Func::vkCmdPipelineBarrier2KHR,
        );
        assert_eq!(Func::vkQueueSubmit.resolve_alias(), Func::vkQueueSubmit);
        assert_eq!(
            Func::vkQueueSubmit2KHR.resolve_alias(),
            Func::vkQueueSubmit2KHR,
        );
    }
}
