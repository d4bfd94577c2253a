//! Built-in catalogue of the engine's HTTP exports.
//!
//! Engine enums (memory type, reading type, show style, address mode,
//! register id) are byte-sized and travel as `UInt8`. Out-pointers of scalar
//! type are passed by value, the engine fills them in on its side.

use hdbg_wire::WireType::{
    self, Bool, ByteBuffer, Int32, Pointer, StringArray, UInt8, UInt16, UInt32, UInt64,
    Utf8String, Void, WideString,
};

use crate::endpoint::{Endpoint, StructDef};
use crate::schema::Schema;

const DEBUGGER_DT_COMMAND_OPTIONS: &str = "DEBUGGER_DT_COMMAND_OPTIONS";
const GUEST_REGS: &str = "GUEST_REGS";
const GUEST_EXTRA_REGISTERS: &str = "GUEST_EXTRA_REGISTERS";
const LAPIC_PAGE: &str = "LAPIC_PAGE";
const IO_APIC_ENTRY_PACKETS: &str = "IO_APIC_ENTRY_PACKETS";
const INTERRUPT_DESCRIPTOR_TABLE_ENTRIES_PACKETS: &str =
    "INTERRUPT_DESCRIPTOR_TABLE_ENTRIES_PACKETS";

fn by_ptr(name: &str) -> WireType {
    WireType::StructByPointer(name.to_string())
}

impl Schema {
    /// The HyperDbg export API as served by the engine's HTTP listener.
    pub fn hyperdbg() -> Self {
        Self::from_parts(endpoints(), structs())
    }
}

fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("VmxSupportDetection", Bool),
        Endpoint::new("CpuReadVendorString", Void).param("vendor_string", Utf8String),
        Endpoint::new("HyperDbgLoadVmmModule", Int32),
        Endpoint::new("HyperDbgUnloadVmm", Int32),
        Endpoint::new("HyperDbgInstallVmmDriver", Int32),
        Endpoint::new("HyperDbgUninstallVmmDriver", Int32),
        Endpoint::new("HyperDbgStopVmmDriver", Int32),
        Endpoint::new("HyperDbgInterpreter", Int32).param("command", Utf8String),
        Endpoint::new("HyperDbgTestCommandParser", Bool)
            .param("command", Utf8String)
            .param("number_of_tokens", UInt32)
            .param("tokens_list", StringArray)
            .param("failed_token_num", UInt32)
            .param("failed_token_position", UInt32),
        Endpoint::new("HyperDbgTestCommandParserShowTokens", Void).param("command", Utf8String),
        Endpoint::new("HyperDbgShowSignature", Void),
        Endpoint::new("SetTextMessageCallback", Void),
        Endpoint::new("SetTextMessageCallbackUsingSharedBuffer", Void),
        Endpoint::new("UnsetTextMessageCallback", Void),
        Endpoint::new("ScriptReadFileAndExecuteCommandline", Int32)
            .param("argc", Int32)
            .param("argv", Utf8String),
        Endpoint::new("ContinuePreviousCommand", Bool),
        Endpoint::new("CheckMultilineCommand", Bool)
            .param("current_command", Utf8String)
            .param("reset", Bool),
        Endpoint::new("ConnectLocalDebugger", Void),
        Endpoint::new("ConnectRemoteDebugger", Bool)
            .param("ip", Utf8String)
            .param("port", Utf8String),
        Endpoint::new("Continue", Void),
        Endpoint::new("Pause", Void),
        Endpoint::new("SetBreakPoint", Void)
            .param("address", UInt64)
            .param("pid", UInt32)
            .param("tid", UInt32)
            .param("core_numer", UInt32),
        Endpoint::new("SetCustomDriverPath", Bool)
            .param("driver_file_path", Utf8String)
            .param("driver_name", Utf8String),
        Endpoint::new("UseDefaultDriverPath", Void),
        Endpoint::new("HyperDbgReadMemory", Bool)
            .param("target_address", UInt64)
            .param("memory_type", UInt8)
            .param("reading_Type", UInt8)
            .param("pid", UInt32)
            .param("size", UInt32)
            .param("get_address_mode", Bool)
            .param("address_mode", UInt8)
            .param("target_buffer_to_store", ByteBuffer)
            .param("return_length", UInt32),
        Endpoint::new("HyperDbgShowMemoryOrDisassemble", Void)
            .param("style", UInt8)
            .param("address", UInt64)
            .param("memory_type", UInt8)
            .param("reading_type", UInt8)
            .param("pid", UInt32)
            .param("size", UInt32)
            .param("dt_details", by_ptr(DEBUGGER_DT_COMMAND_OPTIONS)),
        Endpoint::new("HyperDbgReadAllRegisters", Bool)
            .param("guest_registers", by_ptr(GUEST_REGS))
            .param("extra_registers", by_ptr(GUEST_EXTRA_REGISTERS)),
        Endpoint::new("HyperDbgReadTargetRegister", Bool)
            .param("register_id", UInt8)
            .param("target_register", UInt64),
        Endpoint::new("HyperDbgWriteTargetRegister", Bool)
            .param("register_id", UInt8)
            .param("value", UInt64),
        Endpoint::new("HyperDbgRegisterShowAll", Bool),
        Endpoint::new("HyperDbgRegisterShowTargetRegister", Bool).param("register_id", UInt8),
        Endpoint::new("HyperDbgWriteMemory", Bool)
            .param("destination_address", Pointer)
            .param("memory_type", UInt8)
            .param("process_id", UInt32)
            .param("source_address", Pointer)
            .param("number_of_bytes", UInt32),
        Endpoint::new("DebuggerGetKernelBase", UInt64),
        Endpoint::new("HyperDbgDebugRemoteDeviceUsingComPort", Bool)
            .param("port_name", Utf8String)
            .param("baudrate", UInt32)
            .param("pause_after_connection", Bool),
        Endpoint::new("HyperDbgDebugRemoteDeviceUsingNamedPipe", Bool)
            .param("named_pipe", Utf8String)
            .param("pause_after_connection", Bool),
        Endpoint::new("HyperDbgDebugCloseRemoteDebugger", Bool),
        Endpoint::new("HyperDbgDebugCurrentDeviceUsingComPort", Bool)
            .param("port_name", Utf8String)
            .param("baudrate", UInt32),
        Endpoint::new("StartProcess", Bool).param("path", WideString),
        Endpoint::new("StartProcessWithArgs", Bool)
            .param("path", WideString)
            .param("arguments", WideString),
        Endpoint::new("HyperDbgAssembleGetLength", Bool)
            .param("assembly_code", Utf8String)
            .param("start_address", UInt64)
            .param("length", UInt32),
        Endpoint::new("HyperDbgAssemble", Bool)
            .param("assembly_code", Utf8String)
            .param("start_address", UInt64)
            .param("buffer_to_store_assembled_data", Pointer)
            .param("buffer_size", UInt32),
        Endpoint::new("SetupPathForFileName", Bool)
            .param("filename", Utf8String)
            .param("file_location", Utf8String)
            .param("buffer_len", UInt32)
            .param("check_file_existence", Bool),
        Endpoint::new("SteppingInstrumentationStepIn", Bool),
        Endpoint::new("SteppingRegularStepIn", Bool),
        Endpoint::new("SteppingStepOver", Bool),
        Endpoint::new("SteppingInstrumentationStepInForTracking", Bool),
        Endpoint::new("SteppingStepOverForGu", Bool).param("last_instruction", Bool),
        Endpoint::new("HyperDbgGetLocalApic", Bool)
            .param("local_apic", by_ptr(LAPIC_PAGE))
            .param("is_using_x2apic", Bool),
        Endpoint::new("HyperDbgGetIoApic", Bool).param("io_apic", by_ptr(IO_APIC_ENTRY_PACKETS)),
        Endpoint::new("HyperDbgGetIdtEntry", Bool)
            .param("idt_packet", by_ptr(INTERRUPT_DESCRIPTOR_TABLE_ENTRIES_PACKETS)),
        Endpoint::new("HwdbgScriptRunScript", Bool)
            .param("script", Utf8String)
            .param("instance_filepath_to_read", Utf8String)
            .param("hardware_script_file_path_to_save", Utf8String)
            .param("initial_bram_buffer_size", UInt32),
        Endpoint::new("ScriptEngineWrapperTestParserForHwdbg", Void).param("Expr", Utf8String),
        Endpoint::new("HyperDbgEnableTransparentMode", Bool)
            .param("ProcessId", UInt32)
            .param("ProcessName", Utf8String)
            .param("IsProcessId", Bool),
        Endpoint::new("HyperDbgDisableTransparentMode", Bool),
    ]
}

/// Engine structs. Fixed-size arrays travel as hex `ByteBuffer`s.
fn structs() -> Vec<StructDef> {
    let gprs = [
        "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
        "r13", "r14", "r15",
    ];
    let guest_regs = gprs
        .into_iter()
        .fold(StructDef::new(GUEST_REGS), |def, reg| def.field(reg, UInt64));

    let lapic_registers = [
        "Id",
        "Version",
        "TPR",
        "ArbitrationPriority",
        "ProcessorPriority",
        "EOI",
        "RemoteRead",
        "LogicalDestination",
        "DestinationFormat",
        "SpuriousInterruptVector",
    ];
    let lvt_registers = [
        "ErrorStatus",
        "LvtCmci",
        "IcrLow",
        "IcrHigh",
        "LvtTimer",
        "LvtThermalSensor",
        "LvtPerfMonCounters",
        "LvtLINT0",
        "LvtLINT1",
        "LvtError",
        "InitialCount",
        "CurrentCount",
        "DivideConfiguration",
        "SelfIpi",
    ];
    let lapic_page = lapic_registers
        .into_iter()
        .fold(StructDef::new(LAPIC_PAGE), |def, reg| def.field(reg, UInt32))
        .field("ISR", ByteBuffer)
        .field("TMR", ByteBuffer)
        .field("IRR", ByteBuffer);
    let lapic_page = lvt_registers
        .into_iter()
        .fold(lapic_page, |def, reg| def.field(reg, UInt32));

    vec![
        StructDef::new(DEBUGGER_DT_COMMAND_OPTIONS)
            .field("TypeName", Utf8String)
            .field("SizeOfTypeName", UInt64)
            .field("Address", UInt64)
            .field("IsStruct", Bool)
            .field("BufferAddress", Pointer)
            .field("TargetPid", UInt32)
            .field("AdditionalParameters", Utf8String),
        guest_regs,
        StructDef::new(GUEST_EXTRA_REGISTERS)
            .field("CS", UInt16)
            .field("DS", UInt16)
            .field("FS", UInt16)
            .field("GS", UInt16)
            .field("ES", UInt16)
            .field("SS", UInt16)
            .field("RFLAGS", UInt64)
            .field("RIP", UInt64),
        lapic_page,
        StructDef::new(IO_APIC_ENTRY_PACKETS)
            .field("ApicBasePa", UInt64)
            .field("ApicBaseVa", UInt64)
            .field("IoIdReg", UInt32)
            .field("IoLl", UInt32)
            .field("IoArbIdReg", UInt32)
            .field("LlLhData", ByteBuffer),
        StructDef::new(INTERRUPT_DESCRIPTOR_TABLE_ENTRIES_PACKETS)
            .field("KernelStatus", UInt32)
            .field("IdtEntry", ByteBuffer),
    ]
}
