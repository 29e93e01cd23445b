//! # Windows Backend
//!
//! Native capabilities on top of the `windows` crate:
//!
//! - XInput polling for the configured user slot
//! - `SendInput` keyboard and mouse injection, `Get/SetCursorPos` for the cursor
//! - `Beep` for audible cues
//! - Foreground window minimize/restore
//! - Default audio output switching through MMDevice plus the undocumented
//!   policy-config object (optional)
//! - Controller power-off through ordinal 103 of `xinput1_3.dll` (optional)
//!
//! Every handle is released in `Drop`.

use std::ffi::c_void;
use std::mem::size_of;

use tracing::{debug, info};
use windows::core::{interface, s, IUnknown, IUnknown_Vtbl, GUID, HRESULT, HSTRING, PCSTR, PCWSTR};
use windows::Win32::Foundation::{FreeLibrary, HMODULE, HWND, POINT};
use windows::Win32::Media::Audio::{
    eConsole, eRender, IMMDeviceEnumerator, MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::System::Diagnostics::Debug::Beep;
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN,
    MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL,
    MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY, VK_DOWN, VK_LEFT, VK_LWIN, VK_RETURN, VK_RIGHT,
    VK_UP,
};
use windows::Win32::UI::Input::XboxController::{XInputGetState, XINPUT_GAMEPAD, XINPUT_STATE};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetForegroundWindow, GetWindowPlacement, SetCursorPos, ShowWindow,
    SW_FORCEMINIMIZE, SW_RESTORE, SW_SHOWMAXIMIZED, SW_SHOWMINIMIZED, SW_SHOWNORMAL,
    WINDOWPLACEMENT,
};

use super::{
    AudibleCue, AudioEndpoints, Capabilities, ControllerPower, EndpointId, GamepadSource,
    InputInjector, Key, MouseButton, WindowHandle, WindowManager, WindowPlacement,
};
use crate::config::Config;
use crate::controller::{Buttons, InputSnapshot};
use crate::error::{PadMouseError, Result};

/// Library exporting the hidden power-off entry point.
const XINPUT_LIBRARY: PCSTR = s!("xinput1_3.dll");
/// Export ordinal of `XInputPowerOffController`.
const POWER_OFF_ORDINAL: usize = 103;

const CLSID_POLICY_CONFIG: GUID = GUID::from_u128(0x870af99c_171d_4f9e_af0d_e63df40c2bc9);

fn audio_err(e: windows::core::Error) -> PadMouseError {
    PadMouseError::AudioDevice(e.message())
}

/// Converts an XInput report into a snapshot.
#[must_use]
pub fn snapshot_from_gamepad(pad: &XINPUT_GAMEPAD) -> InputSnapshot {
    InputSnapshot {
        buttons: Buttons::from_bits(pad.wButtons.0),
        left_stick_x: i32::from(pad.sThumbLX),
        left_stick_y: i32::from(pad.sThumbLY),
        right_stick_x: i32::from(pad.sThumbRX),
        right_stick_y: i32::from(pad.sThumbRY),
        left_trigger: pad.bLeftTrigger,
        right_trigger: pad.bRightTrigger,
    }
}

/// XInput controller in one user slot.
#[derive(Debug)]
pub struct XInputGamepad {
    user_index: u32,
}

impl XInputGamepad {
    #[must_use]
    pub fn new(user_index: u32) -> Self {
        Self { user_index }
    }
}

impl GamepadSource for XInputGamepad {
    fn poll(&mut self) -> Result<InputSnapshot> {
        let mut state = XINPUT_STATE::default();
        let status = unsafe { XInputGetState(self.user_index, &mut state) };
        if status != 0 {
            return Err(PadMouseError::Controller(format!(
                "XInput slot {} not connected (status {})",
                self.user_index, status
            )));
        }
        Ok(snapshot_from_gamepad(&state.Gamepad))
    }
}

fn virtual_key(key: Key) -> VIRTUAL_KEY {
    match key {
        Key::Up => VK_UP,
        Key::Down => VK_DOWN,
        Key::Left => VK_LEFT,
        Key::Right => VK_RIGHT,
        Key::Super => VK_LWIN,
        Key::Enter => VK_RETURN,
    }
}

fn button_flags(button: MouseButton) -> (MOUSE_EVENT_FLAGS, MOUSE_EVENT_FLAGS) {
    match button {
        MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
        MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
    }
}

/// `SendInput` based injector.
#[derive(Debug, Default)]
pub struct SendInputInjector;

impl SendInputInjector {
    fn send(input: INPUT) {
        let sent = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
        if sent != 1 {
            debug!("SendInput rejected event");
        }
    }

    fn key(key: Key, flags: KEYBD_EVENT_FLAGS) {
        Self::send(INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: virtual_key(key),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        });
    }

    fn mouse(flags: MOUSE_EVENT_FLAGS, data: i32) {
        Self::send(INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: data,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        });
    }
}

impl InputInjector for SendInputInjector {
    fn key_down(&mut self, key: Key) {
        Self::key(key, KEYBD_EVENT_FLAGS(0));
    }

    fn key_up(&mut self, key: Key) {
        Self::key(key, KEYEVENTF_KEYUP);
    }

    fn mouse_button_down(&mut self, button: MouseButton) {
        Self::mouse(button_flags(button).0, 0);
    }

    fn mouse_button_up(&mut self, button: MouseButton) {
        Self::mouse(button_flags(button).1, 0);
    }

    fn mouse_wheel(&mut self, delta: i32) {
        Self::mouse(MOUSEEVENTF_WHEEL, delta);
    }

    fn move_cursor_to(&mut self, x: i32, y: i32) {
        if let Err(e) = unsafe { SetCursorPos(x, y) } {
            debug!("SetCursorPos failed: {}", e);
        }
    }

    fn cursor_position(&mut self) -> (i32, i32) {
        let mut point = POINT::default();
        match unsafe { GetCursorPos(&mut point) } {
            Ok(()) => (point.x, point.y),
            Err(e) => {
                debug!("GetCursorPos failed: {}", e);
                (0, 0)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct SpeakerBeep;

impl AudibleCue for SpeakerBeep {
    fn beep(&mut self, frequency_hz: u32, duration_ms: u32) {
        if let Err(e) = unsafe { Beep(frequency_hz, duration_ms) } {
            debug!("Beep failed: {}", e);
        }
    }
}

/// Foreground window minimize/restore.
#[derive(Debug, Default)]
pub struct DesktopWindows;

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut c_void)
}

impl WindowManager for DesktopWindows {
    fn foreground_window(&self) -> Option<WindowHandle> {
        let window = unsafe { GetForegroundWindow() };
        if window.is_invalid() {
            None
        } else {
            Some(WindowHandle(window.0 as isize))
        }
    }

    fn placement(&self, window: WindowHandle) -> WindowPlacement {
        let mut placement = WINDOWPLACEMENT {
            length: size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        if unsafe { GetWindowPlacement(hwnd(window), &mut placement) }.is_err() {
            return WindowPlacement::Unknown;
        }
        match placement.showCmd {
            cmd if cmd == SW_SHOWMINIMIZED.0 as u32 => WindowPlacement::Minimized,
            cmd if cmd == SW_SHOWMAXIMIZED.0 as u32 => WindowPlacement::Maximized,
            cmd if cmd == SW_SHOWNORMAL.0 as u32 => WindowPlacement::Normal,
            _ => WindowPlacement::Unknown,
        }
    }

    fn minimize(&mut self, window: WindowHandle) {
        // Return value is the previous visibility, not an error
        let _ = unsafe { ShowWindow(hwnd(window), SW_FORCEMINIMIZE) };
    }

    fn restore(&mut self, window: WindowHandle) {
        let _ = unsafe { ShowWindow(hwnd(window), SW_RESTORE) };
    }
}

type PowerOffFn = unsafe extern "system" fn(u32) -> u32;

/// `XInputPowerOffController` resolved from `xinput1_3.dll`.
///
/// The library stays loaded until this is dropped.
pub struct XInputPowerOff {
    module: HMODULE,
    power_off: PowerOffFn,
}

impl std::fmt::Debug for XInputPowerOff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XInputPowerOff").finish_non_exhaustive()
    }
}

impl XInputPowerOff {
    /// Loads the library and resolves the export by ordinal.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` when the library or export is missing.
    pub fn load() -> Result<Self> {
        let module = unsafe { LoadLibraryA(XINPUT_LIBRARY) }.map_err(|e| {
            PadMouseError::CapabilityUnavailable(format!("xinput1_3.dll: {}", e.message()))
        })?;

        let ordinal = PCSTR(POWER_OFF_ORDINAL as *const u8);
        let Some(proc) = (unsafe { GetProcAddress(module, ordinal) }) else {
            if let Err(e) = unsafe { FreeLibrary(module) } {
                debug!("FreeLibrary failed: {}", e);
            }
            return Err(PadMouseError::CapabilityUnavailable(
                "xinput1_3.dll has no power-off export".to_string(),
            ));
        };

        // SAFETY: ordinal 103 of xinput1_3 is DWORD WINAPI(DWORD)
        let power_off = unsafe { std::mem::transmute::<_, PowerOffFn>(proc) };
        Ok(Self { module, power_off })
    }
}

impl ControllerPower for XInputPowerOff {
    fn power_off(&mut self, user_index: u32) -> bool {
        unsafe { (self.power_off)(user_index) == 0 }
    }
}

impl Drop for XInputPowerOff {
    fn drop(&mut self) {
        if let Err(e) = unsafe { FreeLibrary(self.module) } {
            debug!("FreeLibrary failed: {}", e);
        }
    }
}

/// Undocumented `IPolicyConfig` (Windows 7 and later). Only
/// `SetDefaultEndpoint` is called; the other slots keep the vtable layout.
#[interface("f8679f50-850a-41cf-9c72-430f290290c8")]
unsafe trait IPolicyConfig: IUnknown {
    fn GetMixFormat(&self, device: PCWSTR, format: *mut *mut c_void) -> HRESULT;
    fn GetDeviceFormat(&self, device: PCWSTR, default: i32, format: *mut *mut c_void) -> HRESULT;
    fn ResetDeviceFormat(&self, device: PCWSTR) -> HRESULT;
    fn SetDeviceFormat(&self, device: PCWSTR, endpoint: *mut c_void, mix: *mut c_void) -> HRESULT;
    fn GetProcessingPeriod(
        &self,
        device: PCWSTR,
        default: i32,
        default_period: *mut i64,
        min_period: *mut i64,
    ) -> HRESULT;
    fn SetProcessingPeriod(&self, device: PCWSTR, period: *mut i64) -> HRESULT;
    fn GetShareMode(&self, device: PCWSTR, mode: *mut c_void) -> HRESULT;
    fn SetShareMode(&self, device: PCWSTR, mode: *mut c_void) -> HRESULT;
    fn GetPropertyValue(&self, device: PCWSTR, key: *const c_void, value: *mut c_void) -> HRESULT;
    fn SetPropertyValue(&self, device: PCWSTR, key: *const c_void, value: *mut c_void) -> HRESULT;
    fn SetDefaultEndpoint(&self, device: PCWSTR, role: i32) -> HRESULT;
    fn SetEndpointVisibility(&self, device: PCWSTR, visible: i32) -> HRESULT;
}

/// COM initialization for the current thread, undone on drop.
struct ComApartment;

impl ComApartment {
    fn enter() -> Result<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| PadMouseError::CapabilityUnavailable(format!("COM: {}", e.message())))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Render endpoint enumeration and default switching.
///
/// Fields drop in declaration order, so the COM objects are released before
/// the apartment is left.
pub struct MmAudioEndpoints {
    enumerator: IMMDeviceEnumerator,
    policy: IPolicyConfig,
    _com: ComApartment,
}

impl std::fmt::Debug for MmAudioEndpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmAudioEndpoints").finish_non_exhaustive()
    }
}

impl MmAudioEndpoints {
    /// Creates the device enumerator and the policy-config object.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` when either COM object cannot be created.
    pub fn create() -> Result<Self> {
        let com = ComApartment::enter()?;
        let unavailable =
            |e: windows::core::Error| PadMouseError::CapabilityUnavailable(e.message());

        let policy: IPolicyConfig =
            unsafe { CoCreateInstance(&CLSID_POLICY_CONFIG, None, CLSCTX_ALL) }
                .map_err(unavailable)?;
        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
                .map_err(unavailable)?;

        Ok(Self {
            enumerator,
            policy,
            _com: com,
        })
    }
}

fn device_id(id: windows::core::PWSTR) -> Result<EndpointId> {
    let text = unsafe { id.to_string() };
    unsafe { CoTaskMemFree(Some(id.0 as *const c_void)) };
    text.map(EndpointId)
        .map_err(|e| PadMouseError::AudioDevice(format!("Invalid endpoint id: {}", e)))
}

impl AudioEndpoints for MmAudioEndpoints {
    fn active_render_endpoints(&self) -> Result<Vec<EndpointId>> {
        let collection = unsafe {
            self.enumerator
                .EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
        }
        .map_err(audio_err)?;
        let count = unsafe { collection.GetCount() }.map_err(audio_err)?;

        let mut endpoints = Vec::with_capacity(count as usize);
        for i in 0..count {
            let device = unsafe { collection.Item(i) }.map_err(audio_err)?;
            let id = unsafe { device.GetId() }.map_err(audio_err)?;
            endpoints.push(device_id(id)?);
        }
        Ok(endpoints)
    }

    fn default_render_endpoint(&self) -> Result<EndpointId> {
        let device = unsafe { self.enumerator.GetDefaultAudioEndpoint(eRender, eConsole) }
            .map_err(audio_err)?;
        let id = unsafe { device.GetId() }.map_err(audio_err)?;
        device_id(id)
    }

    fn set_default_render_endpoint(&mut self, id: &EndpointId) -> Result<()> {
        let wide = HSTRING::from(id.0.as_str());
        unsafe { self.policy.SetDefaultEndpoint(PCWSTR(wide.as_ptr()), eConsole.0) }
            .ok()
            .map_err(audio_err)
    }
}

/// Opens XInput and `SendInput`; audio, window and power-off capabilities are
/// resolved here once and left out if unavailable.
///
/// # Errors
///
/// Never fails today; the signature matches the other backends.
pub fn open(config: &Config) -> Result<Capabilities> {
    let user_index = config.controller.user_index;
    info!("Polling XInput controller slot {}", user_index);

    let audio: Option<Box<dyn AudioEndpoints>> = match MmAudioEndpoints::create() {
        Ok(endpoints) => Some(Box::new(endpoints)),
        Err(e) => {
            debug!("Audio output switching unavailable: {}", e);
            None
        }
    };

    let power: Option<Box<dyn ControllerPower>> = match XInputPowerOff::load() {
        Ok(power) => Some(Box::new(power)),
        Err(e) => {
            debug!("Controller power-off unavailable: {}", e);
            None
        }
    };

    Ok(Capabilities {
        gamepad: Box::new(XInputGamepad::new(user_index)),
        injector: Box::new(SendInputInjector),
        cue: Box::new(SpeakerBeep),
        audio,
        windows: Some(Box::new(DesktopWindows)),
        power,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::UI::Input::XboxController::{
        XINPUT_GAMEPAD_A, XINPUT_GAMEPAD_BACK, XINPUT_GAMEPAD_START,
    };

    #[test]
    fn test_snapshot_from_gamepad() {
        let pad = XINPUT_GAMEPAD {
            wButtons: XINPUT_GAMEPAD_A,
            bLeftTrigger: 10,
            bRightTrigger: 255,
            sThumbLX: -32768,
            sThumbLY: 32767,
            sThumbRX: 0,
            sThumbRY: -7001,
        };

        let snapshot = snapshot_from_gamepad(&pad);
        assert_eq!(snapshot.buttons, Buttons::A);
        assert_eq!(snapshot.left_stick_x, -32768);
        assert_eq!(snapshot.left_stick_y, 32767);
        assert_eq!(snapshot.right_stick_y, -7001);
        assert_eq!(snapshot.right_trigger, 255);
    }

    #[test]
    fn test_button_bits_match_xinput() {
        assert_eq!(Buttons::A.bits(), XINPUT_GAMEPAD_A.0);
        assert_eq!(
            (Buttons::BACK | Buttons::START).bits(),
            XINPUT_GAMEPAD_BACK.0 | XINPUT_GAMEPAD_START.0
        );
    }

    #[test]
    fn test_mouse_flags_pair_up() {
        let (down, up) = button_flags(MouseButton::Left);
        assert_eq!(down, MOUSEEVENTF_LEFTDOWN);
        assert_eq!(up, MOUSEEVENTF_LEFTUP);
    }

    #[test]
    #[ignore] // Requires a desktop session with audio devices
    fn test_enumerate_audio_outputs() {
        let endpoints = MmAudioEndpoints::create().unwrap();
        let list = endpoints.active_render_endpoints().unwrap();
        let current = endpoints.default_render_endpoint().unwrap();
        assert!(list.contains(&current));
    }
}
