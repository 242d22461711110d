//! Unit tests for the debug messenger routing (no GPU required)

use super::*;

#[test]
fn test_severity_mapping() {
    assert_eq!(severity_from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), LogSeverity::Error);
    assert_eq!(severity_from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), LogSeverity::Warn);
    assert_eq!(severity_from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), LogSeverity::Debug);
    assert_eq!(severity_from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), LogSeverity::Trace);
}

#[test]
fn test_message_type_names() {
    assert_eq!(message_type_name(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION), "Validation");
    assert_eq!(message_type_name(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), "Performance");
    assert_eq!(message_type_name(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL), "General");
}

#[test]
fn test_callback_counts_messages() {
    let message = c"vkCreateImage: extent is zero";
    let id = c"VUID-VkImageCreateInfo-extent-00944";
    let data = vk::DebugUtilsMessengerCallbackDataEXT::default()
        .message(message)
        .message_id_name(id);

    let before = validation_stats();
    let result = unsafe {
        vulkan_debug_callback(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            &data,
            std::ptr::null_mut(),
        )
    };
    let after = validation_stats();

    assert_eq!(result, vk::FALSE);
    assert!(after.warnings > before.warnings);
    assert!(after.total() > before.total());
}

#[test]
fn test_callback_ignores_null_data() {
    let result = unsafe {
        vulkan_debug_callback(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
            std::ptr::null(),
            std::ptr::null_mut(),
        )
    };
    assert_eq!(result, vk::FALSE);
}
