// ABOUTME: User-agent based device detection for refresh token metadata
// ABOUTME: Derives a coarse device type and a "<Browser> on <OS>" display name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Hireline

use crate::models::DeviceInfo;

/// Device type for phones
pub const DEVICE_TYPE_MOBILE: &str = "mobile";
/// Device type for tablets
pub const DEVICE_TYPE_TABLET: &str = "tablet";
/// Device type for desktop browsers
pub const DEVICE_TYPE_DESKTOP: &str = "desktop";
/// Device type when the user agent is missing or unrecognized
pub const DEVICE_TYPE_UNKNOWN: &str = "unknown";

const UNKNOWN_BROWSER: &str = "Unknown Browser";
const UNKNOWN_OS: &str = "Unknown OS";

/// Detected device classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedDevice {
    /// One of mobile, tablet, desktop, unknown
    pub device_type: &'static str,
    /// "<Browser> on <OS>"
    pub device_name: String,
}

/// Classify a user agent string
#[must_use]
pub fn detect_device(user_agent: &str) -> DetectedDevice {
    let ua = user_agent.trim();
    DetectedDevice {
        device_type: detect_type(ua),
        device_name: format!("{} on {}", detect_browser(ua), detect_os(ua)),
    }
}

/// Fill in device type and name from the user agent where the client did not supply them
#[must_use]
pub fn enrich_device_info(mut device: DeviceInfo) -> DeviceInfo {
    let detected = detect_device(device.user_agent.as_deref().unwrap_or_default());

    if device.device_type.as_deref().is_none_or(str::is_empty) {
        device.device_type = Some(detected.device_type.to_owned());
    }
    if device.device_name.as_deref().is_none_or(str::is_empty) {
        device.device_name = Some(detected.device_name);
    }
    device
}

fn detect_type(ua: &str) -> &'static str {
    if ua.is_empty() {
        return DEVICE_TYPE_UNKNOWN;
    }
    if ua.contains("iPad") || ua.contains("Tablet") || (ua.contains("Android") && !ua.contains("Mobile"))
    {
        return DEVICE_TYPE_TABLET;
    }
    if ua.contains("Mobile") || ua.contains("iPhone") || ua.contains("Android") {
        return DEVICE_TYPE_MOBILE;
    }
    if ua.contains("Windows") || ua.contains("Macintosh") || ua.contains("Linux") || ua.contains("CrOS")
    {
        return DEVICE_TYPE_DESKTOP;
    }
    DEVICE_TYPE_UNKNOWN
}

fn detect_browser(ua: &str) -> &'static str {
    // Order matters: Edge and Opera also advertise Chrome, Chrome also advertises Safari
    if ua.contains("Edg/") || ua.contains("EdgA/") || ua.contains("EdgiOS/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("SamsungBrowser") {
        "Samsung Internet"
    } else if ua.contains("Firefox/") || ua.contains("FxiOS/") {
        "Firefox"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Safari/") {
        "Safari"
    } else {
        UNKNOWN_BROWSER
    }
}

fn detect_os(ua: &str) -> &'static str {
    if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        "iOS"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("CrOS") {
        "ChromeOS"
    } else if ua.contains("Macintosh") || ua.contains("Mac OS X") {
        "macOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        UNKNOWN_OS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const EDGE_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51";
    const CHROME_ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X710) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

    #[test]
    fn test_desktop_browsers() {
        let chrome = detect_device(CHROME_WINDOWS);
        assert_eq!(chrome.device_type, DEVICE_TYPE_DESKTOP);
        assert_eq!(chrome.device_name, "Chrome on Windows");

        let edge = detect_device(EDGE_MAC);
        assert_eq!(edge.device_type, DEVICE_TYPE_DESKTOP);
        assert_eq!(edge.device_name, "Edge on macOS");

        assert_eq!(detect_device(FIREFOX_LINUX).device_name, "Firefox on Linux");
    }

    #[test]
    fn test_mobile_and_tablet() {
        let iphone = detect_device(SAFARI_IPHONE);
        assert_eq!(iphone.device_type, DEVICE_TYPE_MOBILE);
        assert_eq!(iphone.device_name, "Safari on iOS");

        let tablet = detect_device(CHROME_ANDROID_TABLET);
        assert_eq!(tablet.device_type, DEVICE_TYPE_TABLET);
        assert_eq!(tablet.device_name, "Chrome on Android");
    }

    #[test]
    fn test_empty_user_agent() {
        let unknown = detect_device("");
        assert_eq!(unknown.device_type, DEVICE_TYPE_UNKNOWN);
        assert_eq!(unknown.device_name, "Unknown Browser on Unknown OS");
    }

    #[test]
    fn test_enrich_keeps_client_supplied_values() {
        let device = enrich_device_info(DeviceInfo {
            device_name: Some("Ana's laptop".into()),
            user_agent: Some(CHROME_WINDOWS.into()),
            ..DeviceInfo::default()
        });
        assert_eq!(device.device_name.as_deref(), Some("Ana's laptop"));
        assert_eq!(device.device_type.as_deref(), Some(DEVICE_TYPE_DESKTOP));

        let bare = enrich_device_info(DeviceInfo::default());
        assert_eq!(bare.device_type.as_deref(), Some(DEVICE_TYPE_UNKNOWN));
        assert_eq!(bare.device_name.as_deref(), Some("Unknown Browser on Unknown OS"));
    }
}
