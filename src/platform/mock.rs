// ── Recording backend for tests ───────────────────────────────────────────────
//
// Models the WGL rules the bootstrap has to respect: symbols from the
// context path resolve only while a context is current, a window's pixel
// format can be set once, the client area is the outer size minus the frame.
// Every call is logged in order so tests can assert on sequencing.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    ffi::CStr,
    rc::Rc,
};

use crate::boot::format::PixelFormatRequest;

use super::{
    Backend, EventOutcome, FormatIndex, FrameInsets, OsError, OsResult, ProcAddress, ProcLoader,
    WindowEvent, WindowPlacement, WindowProcedure,
};

const ERROR_INVALID_PIXEL_FORMAT: u32 = 2000;
const ERROR_GEN_FAILURE: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MockWindow(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockSurface(MockWindow);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MockContext(u32);

/// Where a descriptor handed to `set_pixel_format` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockDescriptor {
    Baseline(PixelFormatRequest),
    Described(FormatIndex),
}

/// One backend call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    RegisterClass(String),
    CreateWindow(MockWindow),
    DestroyWindow(MockWindow),
    ShowWindow(MockWindow),
    GetSurface(MockWindow),
    ReleaseSurface(MockWindow),
    ChoosePixelFormat(MockWindow),
    ChoosePixelFormatArb(MockWindow),
    DescribePixelFormat(MockWindow),
    SetPixelFormat(MockWindow),
    CreateContext(MockWindow),
    CreateContextAttribsArb(MockWindow),
    MakeCurrent(MockWindow),
    ClearCurrent,
    DeleteContext,
    SwapBuffers(MockWindow),
    SwapInterval(i32),
    Pump(MockWindow),
    ContextLookup(String),
    LibraryLookup(String),
}

/// Steps that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Step {
    RegisterClass,
    CreateWindow,
    GetSurface,
    ChoosePixelFormat,
    ChoosePixelFormatArb,
    DescribePixelFormat,
    SetPixelFormat,
    CreateContext,
    CreateContextAttribsArb,
    MakeCurrent,
    FrameInsets,
    SwapBuffers,
    SwapInterval,
}

pub(crate) struct MockBackend {
    calls: RefCell<Vec<Call>>,
    failing: HashSet<Step>,
    next_id: u32,

    procedure: Option<Rc<dyn WindowProcedure>>,
    classes: HashSet<String>,

    insets: FrameInsets,
    placements: HashMap<MockWindow, WindowPlacement>,
    created: Vec<MockWindow>,
    live: Vec<MockWindow>,
    max_live: usize,

    formats: HashMap<MockWindow, (FormatIndex, MockDescriptor)>,
    format_applications: HashMap<MockWindow, usize>,
    format_violations: usize,

    contexts: HashSet<MockContext>,
    current: Option<(MockWindow, MockContext)>,

    context_symbols: HashMap<String, ProcAddress>,
    library_symbols: HashMap<String, ProcAddress>,

    pixel_attribs: Option<(ProcAddress, Vec<i32>)>,
    context_attribs: Option<(ProcAddress, Vec<i32>)>,

    scheduled: Vec<(usize, Option<MockWindow>, WindowEvent)>,
    queue: VecDeque<(MockWindow, WindowEvent)>,
    pumps: usize,
    dispatched: Vec<WindowEvent>,
    outcomes: Vec<EventOutcome>,
}

impl MockBackend {
    /// A backend that exports no symbols at all.  The frame is a typical
    /// Windows 10 overlapped-window border.
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            failing: HashSet::new(),
            next_id: 1,
            procedure: None,
            classes: HashSet::new(),
            insets: FrameInsets {
                left: 8,
                top: 31,
                right: 8,
                bottom: 8,
            },
            placements: HashMap::new(),
            created: Vec::new(),
            live: Vec::new(),
            max_live: 0,
            formats: HashMap::new(),
            format_applications: HashMap::new(),
            format_violations: 0,
            contexts: HashSet::new(),
            current: None,
            context_symbols: HashMap::new(),
            library_symbols: HashMap::new(),
            pixel_attribs: None,
            context_attribs: None,
            scheduled: Vec::new(),
            queue: VecDeque::new(),
            pumps: 0,
            dispatched: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    /// A driver that exposes both extended creation functions through
    /// `wglGetProcAddress`.
    pub(crate) fn with_wgl_extensions() -> Self {
        let mut backend = Self::new();
        backend.export_context_symbol(c"wglChoosePixelFormatARB", 0x7000);
        backend.export_context_symbol(c"wglCreateContextAttribsARB", 0x7100);
        backend
    }

    // ── Setup ─────────────────────────────────────────────────────────────────

    pub(crate) fn fail(&mut self, step: Step) {
        self.failing.insert(step);
    }

    pub(crate) fn set_insets(&mut self, insets: FrameInsets) {
        self.insets = insets;
    }

    pub(crate) fn export_context_symbol(&mut self, name: &CStr, addr: usize) {
        self.context_symbols.insert(key(name), address(addr));
    }

    pub(crate) fn export_library_symbol(&mut self, name: &CStr, addr: usize) {
        self.library_symbols.insert(key(name), address(addr));
    }

    /// Queue `event` for `window`; it becomes visible to the `pump`-th call
    /// of `pump_messages` (0-based).
    pub(crate) fn schedule(&mut self, pump: usize, window: MockWindow, event: WindowEvent) {
        self.scheduled.push((pump, Some(window), event));
    }

    /// Like `schedule`, addressed to whichever window that pump drains.
    pub(crate) fn schedule_for_pumped(&mut self, pump: usize, event: WindowEvent) {
        self.scheduled.push((pump, None, event));
    }

    /// Queue `event` for `window` immediately.
    pub(crate) fn post(&mut self, window: MockWindow, event: WindowEvent) {
        self.queue.push_back((window, event));
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn symbol(&self, name: &CStr) -> ProcAddress {
        let k = key(name);
        self.context_symbols
            .get(&k)
            .or_else(|| self.library_symbols.get(&k))
            .copied()
            .unwrap_or_else(|| panic!("{k} is not exported"))
    }

    pub(crate) fn created_windows(&self) -> Vec<MockWindow> {
        self.created.clone()
    }

    pub(crate) fn live_windows(&self) -> Vec<MockWindow> {
        self.live.clone()
    }

    pub(crate) fn max_live_windows(&self) -> usize {
        self.max_live
    }

    pub(crate) fn placement(&self, window: MockWindow) -> WindowPlacement {
        self.placements[&window]
    }

    /// Client area of `window`: the outer size minus the frame.
    pub(crate) fn client_size(&self, window: MockWindow) -> (i32, i32) {
        let p = self.placements[&window];
        (
            p.width - self.insets.horizontal(),
            p.height - self.insets.vertical(),
        )
    }

    /// Format and descriptor applied to `window`, if any.
    pub(crate) fn applied_format(
        &self,
        window: MockWindow,
    ) -> Option<(FormatIndex, MockDescriptor)> {
        self.formats.get(&window).copied()
    }

    pub(crate) fn format_applications(&self, window: MockWindow) -> usize {
        self.format_applications.get(&window).copied().unwrap_or(0)
    }

    /// Attempts to set a format on a window that already had one.
    pub(crate) fn format_violations(&self) -> usize {
        self.format_violations
    }

    pub(crate) fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Window whose surface currently has a context bound.
    pub(crate) fn current(&self) -> Option<MockWindow> {
        self.current.map(|(w, _)| w)
    }

    pub(crate) fn last_pixel_attribs(&self) -> Option<(ProcAddress, Vec<i32>)> {
        self.pixel_attribs.clone()
    }

    pub(crate) fn last_context_attribs(&self) -> Option<(ProcAddress, Vec<i32>)> {
        self.context_attribs.clone()
    }

    pub(crate) fn pumps(&self) -> usize {
        self.pumps
    }

    pub(crate) fn dispatched(&self) -> Vec<WindowEvent> {
        self.dispatched.clone()
    }

    /// What the procedure answered for each dispatched event.
    pub(crate) fn outcomes(&self) -> Vec<EventOutcome> {
        self.outcomes.clone()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn failing(&self, step: Step, function: &'static str) -> OsResult<()> {
        if self.failing.contains(&step) {
            Err(OsError {
                function,
                code: ERROR_GEN_FAILURE,
            })
        } else {
            Ok(())
        }
    }

    fn is_live(&self, window: MockWindow) -> bool {
        self.live.contains(&window)
    }

    fn new_context(&mut self) -> MockContext {
        let context = MockContext(self.next_id);
        self.next_id += 1;
        self.contexts.insert(context);
        context
    }
}

fn key(name: &CStr) -> String {
    name.to_string_lossy().into_owned()
}

fn address(addr: usize) -> ProcAddress {
    ProcAddress::new(addr as *const _).expect("non-null test address")
}

impl ProcLoader for MockBackend {
    fn context_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        self.log(Call::ContextLookup(key(name)));
        self.current?;
        self.context_symbols.get(&key(name)).copied()
    }

    fn library_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        self.log(Call::LibraryLookup(key(name)));
        self.library_symbols.get(&key(name)).copied()
    }
}

impl Backend for MockBackend {
    type Window = MockWindow;
    type Surface = MockSurface;
    type Context = MockContext;
    type PixelDescriptor = MockDescriptor;

    fn register_class(&mut self, class: &str, procedure: Rc<dyn WindowProcedure>) -> OsResult<()> {
        self.log(Call::RegisterClass(class.to_owned()));
        self.failing(Step::RegisterClass, "RegisterClassExW")?;
        self.classes.insert(class.to_owned());
        self.procedure = Some(procedure);
        Ok(())
    }

    fn create_window(
        &mut self,
        class: &str,
        _title: &str,
        placement: WindowPlacement,
    ) -> OsResult<MockWindow> {
        self.failing(Step::CreateWindow, "CreateWindowExW")?;
        if !self.classes.contains(class) {
            return Err(OsError {
                function: "CreateWindowExW",
                code: 1407, // ERROR_CANNOT_FIND_WND_CLASS
            });
        }
        let window = MockWindow(self.next_id);
        self.next_id += 1;
        self.log(Call::CreateWindow(window));
        self.placements.insert(window, placement);
        self.created.push(window);
        self.live.push(window);
        self.max_live = self.max_live.max(self.live.len());
        Ok(window)
    }

    fn destroy_window(&mut self, window: MockWindow) -> OsResult<()> {
        self.log(Call::DestroyWindow(window));
        self.live.retain(|&w| w != window);
        Ok(())
    }

    fn show_window(&mut self, window: MockWindow) {
        self.log(Call::ShowWindow(window));
    }

    fn frame_insets(&self) -> OsResult<FrameInsets> {
        self.failing(Step::FrameInsets, "AdjustWindowRectEx")?;
        Ok(self.insets)
    }

    fn surface(&mut self, window: MockWindow) -> Option<MockSurface> {
        self.log(Call::GetSurface(window));
        if self.failing.contains(&Step::GetSurface) || !self.is_live(window) {
            return None;
        }
        Some(MockSurface(window))
    }

    fn release_surface(&mut self, window: MockWindow, _surface: MockSurface) {
        self.log(Call::ReleaseSurface(window));
    }

    fn baseline_descriptor(&self, request: &PixelFormatRequest) -> MockDescriptor {
        MockDescriptor::Baseline(*request)
    }

    fn choose_pixel_format(
        &mut self,
        surface: MockSurface,
        _descriptor: &MockDescriptor,
    ) -> Option<FormatIndex> {
        self.log(Call::ChoosePixelFormat(surface.0));
        if self.failing.contains(&Step::ChoosePixelFormat) {
            return None;
        }
        FormatIndex::new(3)
    }

    fn choose_pixel_format_arb(
        &mut self,
        chooser: ProcAddress,
        surface: MockSurface,
        attribs: &[i32],
    ) -> Option<FormatIndex> {
        self.log(Call::ChoosePixelFormatArb(surface.0));
        self.pixel_attribs = Some((chooser, attribs.to_vec()));
        if self.failing.contains(&Step::ChoosePixelFormatArb) {
            return None;
        }
        FormatIndex::new(9)
    }

    fn describe_pixel_format(
        &mut self,
        surface: MockSurface,
        format: FormatIndex,
    ) -> OsResult<MockDescriptor> {
        self.log(Call::DescribePixelFormat(surface.0));
        self.failing(Step::DescribePixelFormat, "DescribePixelFormat")?;
        Ok(MockDescriptor::Described(format))
    }

    fn set_pixel_format(
        &mut self,
        surface: MockSurface,
        format: FormatIndex,
        descriptor: &MockDescriptor,
    ) -> OsResult<()> {
        let window = surface.0;
        self.log(Call::SetPixelFormat(window));
        self.failing(Step::SetPixelFormat, "SetPixelFormat")?;
        if self.formats.contains_key(&window) {
            self.format_violations += 1;
            return Err(OsError {
                function: "SetPixelFormat",
                code: ERROR_INVALID_PIXEL_FORMAT,
            });
        }
        self.formats.insert(window, (format, *descriptor));
        *self.format_applications.entry(window).or_insert(0) += 1;
        Ok(())
    }

    fn create_context(&mut self, surface: MockSurface) -> OsResult<MockContext> {
        self.log(Call::CreateContext(surface.0));
        self.failing(Step::CreateContext, "wglCreateContext")?;
        if !self.formats.contains_key(&surface.0) {
            return Err(OsError {
                function: "wglCreateContext",
                code: ERROR_INVALID_PIXEL_FORMAT,
            });
        }
        Ok(self.new_context())
    }

    fn create_context_attribs_arb(
        &mut self,
        creator: ProcAddress,
        surface: MockSurface,
        attribs: &[i32],
    ) -> Option<MockContext> {
        self.log(Call::CreateContextAttribsArb(surface.0));
        self.context_attribs = Some((creator, attribs.to_vec()));
        if self.failing.contains(&Step::CreateContextAttribsArb)
            || !self.formats.contains_key(&surface.0)
        {
            return None;
        }
        Some(self.new_context())
    }

    fn make_current(&mut self, surface: MockSurface, context: MockContext) -> OsResult<()> {
        self.log(Call::MakeCurrent(surface.0));
        self.failing(Step::MakeCurrent, "wglMakeCurrent")?;
        if !self.contexts.contains(&context) {
            return Err(OsError {
                function: "wglMakeCurrent",
                code: ERROR_GEN_FAILURE,
            });
        }
        self.current = Some((surface.0, context));
        Ok(())
    }

    fn clear_current(&mut self) -> OsResult<()> {
        self.log(Call::ClearCurrent);
        self.current = None;
        Ok(())
    }

    fn delete_context(&mut self, context: MockContext) -> OsResult<()> {
        self.log(Call::DeleteContext);
        if self.current.map(|(_, c)| c) == Some(context) {
            self.current = None;
        }
        self.contexts.remove(&context);
        Ok(())
    }

    fn swap_buffers(&mut self, surface: MockSurface) -> OsResult<()> {
        self.log(Call::SwapBuffers(surface.0));
        self.failing(Step::SwapBuffers, "SwapBuffers")
    }

    fn set_swap_interval(&mut self, _setter: ProcAddress, interval: i32) -> OsResult<()> {
        self.log(Call::SwapInterval(interval));
        self.failing(Step::SwapInterval, "wglSwapIntervalEXT")?;
        if self.current.is_none() {
            return Err(OsError {
                function: "wglSwapIntervalEXT",
                code: ERROR_GEN_FAILURE,
            });
        }
        Ok(())
    }

    fn pump_messages(&mut self, window: MockWindow) {
        self.log(Call::Pump(window));
        let pump = self.pumps;
        self.pumps += 1;

        let (due, later): (Vec<_>, Vec<_>) =
            self.scheduled.drain(..).partition(|&(at, _, _)| at <= pump);
        self.scheduled = later;
        self.queue
            .extend(due.into_iter().map(|(_, w, event)| (w.unwrap_or(window), event)));

        // Only this window's messages; others stay queued in order.
        let mut rest = VecDeque::new();
        let mut mine = Vec::new();
        for (w, event) in self.queue.drain(..) {
            if w == window {
                mine.push(event);
            } else {
                rest.push_back((w, event));
            }
        }
        self.queue = rest;

        let Some(procedure) = self.procedure.clone() else {
            return;
        };
        for event in mine {
            self.dispatched.push(event);
            let outcome = procedure.handle(event);
            self.outcomes.push(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl WindowProcedure for Echo {
        fn handle(&self, event: WindowEvent) -> EventOutcome {
            match event {
                WindowEvent::CloseRequested => EventOutcome::Handled,
                WindowEvent::Other(_) => EventOutcome::Default,
            }
        }
    }

    fn placement() -> WindowPlacement {
        WindowPlacement {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn pump_drains_only_the_pumped_window() {
        let mut backend = MockBackend::new();
        backend.register_class("Mock", Rc::new(Echo)).unwrap();
        let a = backend.create_window("Mock", "a", placement()).unwrap();
        let b = backend.create_window("Mock", "b", placement()).unwrap();
        backend.post(b, WindowEvent::Other(0x0005));
        backend.post(a, WindowEvent::Other(0x000F));
        backend.post(a, WindowEvent::CloseRequested);

        backend.pump_messages(a);
        assert_eq!(
            backend.dispatched(),
            vec![WindowEvent::Other(0x000F), WindowEvent::CloseRequested]
        );

        backend.pump_messages(b);
        assert_eq!(backend.dispatched().last(), Some(&WindowEvent::Other(0x0005)));
        assert_eq!(backend.pumps(), 2);
    }

    #[test]
    fn context_symbols_need_a_current_context() {
        let backend = MockBackend::with_wgl_extensions();
        assert!(backend.context_proc_address(c"wglChoosePixelFormatARB").is_none());
    }

    #[test]
    fn second_format_on_a_window_is_a_violation() {
        let mut backend = MockBackend::new();
        backend.register_class("Mock", Rc::new(Echo)).unwrap();
        let w = backend.create_window("Mock", "w", placement()).unwrap();
        let surface = backend.surface(w).unwrap();
        let format = FormatIndex::new(1).unwrap();
        let descriptor = backend.describe_pixel_format(surface, format).unwrap();
        backend.set_pixel_format(surface, format, &descriptor).unwrap();
        assert!(backend.set_pixel_format(surface, format, &descriptor).is_err());
        assert_eq!(backend.format_violations(), 1);
    }
}
