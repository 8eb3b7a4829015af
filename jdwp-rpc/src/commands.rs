// JDWP numeric constants
//
// Command set and command ids of the built-in specification, plus the
// constant sets a debugger needs when building requests.

// Command set IDs
pub mod command_sets {
    pub const VIRTUAL_MACHINE: u8 = 1;
    pub const REFERENCE_TYPE: u8 = 2;
    pub const CLASS_TYPE: u8 = 3;
    pub const METHOD: u8 = 6;
    pub const OBJECT_REFERENCE: u8 = 9;
    pub const STRING_REFERENCE: u8 = 10;
    pub const THREAD_REFERENCE: u8 = 11;
    pub const THREAD_GROUP_REFERENCE: u8 = 12;
    pub const ARRAY_REFERENCE: u8 = 13;
    pub const EVENT_REQUEST: u8 = 15;
    pub const STACK_FRAME: u8 = 16;
    pub const EVENT: u8 = 64;
}

// VirtualMachine commands (set 1)
pub mod vm_commands {
    pub const VERSION: u8 = 1;
    pub const CLASSES_BY_SIGNATURE: u8 = 2;
    pub const ALL_CLASSES: u8 = 3;
    pub const ALL_THREADS: u8 = 4;
    pub const TOP_LEVEL_THREAD_GROUPS: u8 = 5;
    pub const DISPOSE: u8 = 6;
    pub const ID_SIZES: u8 = 7;
    pub const SUSPEND: u8 = 8;
    pub const RESUME: u8 = 9;
    pub const EXIT: u8 = 10;
    pub const CREATE_STRING: u8 = 11;
    pub const CAPABILITIES: u8 = 12;
    pub const CLASS_PATHS: u8 = 13;
    pub const DISPOSE_OBJECTS: u8 = 14;
    pub const HOLD_EVENTS: u8 = 15;
    pub const RELEASE_EVENTS: u8 = 16;
}

// ReferenceType commands (set 2)
pub mod reference_type_commands {
    pub const SIGNATURE: u8 = 1;
    pub const CLASS_LOADER: u8 = 2;
    pub const MODIFIERS: u8 = 3;
    pub const FIELDS: u8 = 4;
    pub const METHODS: u8 = 5;
    pub const GET_VALUES: u8 = 6;
    pub const SOURCE_FILE: u8 = 7;
    pub const STATUS: u8 = 9;
    pub const INTERFACES: u8 = 10;
    pub const CLASS_OBJECT: u8 = 11;
}

// ClassType commands (set 3)
pub mod class_type_commands {
    pub const SUPERCLASS: u8 = 1;
}

// Method commands (set 6)
pub mod method_commands {
    pub const LINE_TABLE: u8 = 1;
    pub const VARIABLE_TABLE: u8 = 2;
    pub const BYTECODES: u8 = 3;
}

// ObjectReference commands (set 9)
pub mod object_reference_commands {
    pub const REFERENCE_TYPE: u8 = 1;
    pub const GET_VALUES: u8 = 2;
}

// StringReference commands (set 10)
pub mod string_reference_commands {
    pub const VALUE: u8 = 1;
}

// ThreadReference commands (set 11)
pub mod thread_commands {
    pub const NAME: u8 = 1;
    pub const SUSPEND: u8 = 2;
    pub const RESUME: u8 = 3;
    pub const STATUS: u8 = 4;
    pub const THREAD_GROUP: u8 = 5;
    pub const FRAMES: u8 = 6;
    pub const FRAME_COUNT: u8 = 7;
    pub const SUSPEND_COUNT: u8 = 12;
}

// ThreadGroupReference commands (set 12)
pub mod thread_group_commands {
    pub const NAME: u8 = 1;
}

// ArrayReference commands (set 13)
pub mod array_reference_commands {
    pub const LENGTH: u8 = 1;
}

// EventRequest commands (set 15)
pub mod event_commands {
    pub const SET: u8 = 1;
    pub const CLEAR: u8 = 2;
    pub const CLEAR_ALL_BREAKPOINTS: u8 = 3;
}

// StackFrame commands (set 16)
pub mod stack_frame_commands {
    pub const GET_VALUES: u8 = 1;
    pub const THIS_OBJECT: u8 = 3;
}

// Event commands (set 64)
pub mod event_set_commands {
    pub const COMPOSITE: u8 = 100;
}

// Event kinds for EventRequest.Set and Event.Composite
pub mod event_kinds {
    pub const SINGLE_STEP: u8 = 1;
    pub const BREAKPOINT: u8 = 2;
    pub const FRAME_POP: u8 = 3;
    pub const EXCEPTION: u8 = 4;
    pub const USER_DEFINED: u8 = 5;
    pub const THREAD_START: u8 = 6;
    pub const THREAD_DEATH: u8 = 7;
    pub const CLASS_PREPARE: u8 = 8;
    pub const CLASS_UNLOAD: u8 = 9;
    pub const CLASS_LOAD: u8 = 10;
    pub const FIELD_ACCESS: u8 = 20;
    pub const FIELD_MODIFICATION: u8 = 21;
    pub const EXCEPTION_CATCH: u8 = 30;
    pub const METHOD_ENTRY: u8 = 40;
    pub const METHOD_EXIT: u8 = 41;
    pub const METHOD_EXIT_WITH_RETURN_VALUE: u8 = 42;
    pub const MONITOR_CONTENDED_ENTER: u8 = 43;
    pub const MONITOR_CONTENDED_ENTERED: u8 = 44;
    pub const MONITOR_WAIT: u8 = 45;
    pub const MONITOR_WAITED: u8 = 46;
    pub const VM_START: u8 = 90;
    pub const VM_DEATH: u8 = 99;
}

// Event request modifier kinds
pub mod mod_kinds {
    pub const COUNT: u8 = 1;
    pub const CONDITIONAL: u8 = 2;
    pub const THREAD_ONLY: u8 = 3;
    pub const CLASS_ONLY: u8 = 4;
    pub const CLASS_MATCH: u8 = 5;
    pub const CLASS_EXCLUDE: u8 = 6;
    pub const LOCATION_ONLY: u8 = 7;
    pub const EXCEPTION_ONLY: u8 = 8;
    pub const FIELD_ONLY: u8 = 9;
    pub const STEP: u8 = 10;
    pub const INSTANCE_ONLY: u8 = 11;
    pub const SOURCE_NAME_MATCH: u8 = 12;
}

pub mod suspend_policy {
    pub const NONE: u8 = 0;
    pub const EVENT_THREAD: u8 = 1;
    pub const ALL: u8 = 2;
}

pub mod type_tags {
    pub const CLASS: u8 = 1;
    pub const INTERFACE: u8 = 2;
    pub const ARRAY: u8 = 3;
}

// Step sizes
pub mod step_sizes {
    pub const MIN: i32 = 0;
    pub const LINE: i32 = 1;
}

// Step depths
pub mod step_depths {
    pub const INTO: i32 = 0;
    pub const OVER: i32 = 1;
    pub const OUT: i32 = 2;
}

/// JDWP error constants, in the naming used by specification documents.
pub const ERROR_CONSTANTS: &[(&str, i64)] = &[
    ("Error_NONE", 0),
    ("Error_INVALID_THREAD", 10),
    ("Error_INVALID_THREAD_GROUP", 11),
    ("Error_INVALID_PRIORITY", 12),
    ("Error_THREAD_NOT_SUSPENDED", 13),
    ("Error_THREAD_SUSPENDED", 14),
    ("Error_THREAD_NOT_ALIVE", 15),
    ("Error_INVALID_OBJECT", 20),
    ("Error_INVALID_CLASS", 21),
    ("Error_CLASS_NOT_PREPARED", 22),
    ("Error_INVALID_METHODID", 23),
    ("Error_INVALID_LOCATION", 24),
    ("Error_INVALID_FIELDID", 25),
    ("Error_INVALID_FRAMEID", 30),
    ("Error_NO_MORE_FRAMES", 31),
    ("Error_OPAQUE_FRAME", 32),
    ("Error_NOT_CURRENT_FRAME", 33),
    ("Error_TYPE_MISMATCH", 34),
    ("Error_INVALID_SLOT", 35),
    ("Error_DUPLICATE", 40),
    ("Error_NOT_FOUND", 41),
    ("Error_INVALID_MONITOR", 50),
    ("Error_NOT_MONITOR_OWNER", 51),
    ("Error_INTERRUPT", 52),
    ("Error_INVALID_CLASS_FORMAT", 60),
    ("Error_CIRCULAR_CLASS_DEFINITION", 61),
    ("Error_FAILS_VERIFICATION", 62),
    ("Error_ADD_METHOD_NOT_IMPLEMENTED", 63),
    ("Error_SCHEMA_CHANGE_NOT_IMPLEMENTED", 64),
    ("Error_INVALID_TYPESTATE", 65),
    ("Error_HIERARCHY_CHANGE_NOT_IMPLEMENTED", 66),
    ("Error_DELETE_METHOD_NOT_IMPLEMENTED", 67),
    ("Error_UNSUPPORTED_VERSION", 68),
    ("Error_NAMES_DONT_MATCH", 69),
    ("Error_CLASS_MODIFIERS_CHANGE_NOT_IMPLEMENTED", 70),
    ("Error_METHOD_MODIFIERS_CHANGE_NOT_IMPLEMENTED", 71),
    ("Error_NOT_IMPLEMENTED", 99),
    ("Error_NULL_POINTER", 100),
    ("Error_ABSENT_INFORMATION", 101),
    ("Error_INVALID_EVENT_TYPE", 102),
    ("Error_ILLEGAL_ARGUMENT", 103),
    ("Error_OUT_OF_MEMORY", 110),
    ("Error_ACCESS_DENIED", 111),
    ("Error_VM_DEAD", 112),
    ("Error_INTERNAL", 113),
    ("Error_UNATTACHED_THREAD", 115),
    ("Error_INVALID_TAG", 500),
    ("Error_ALREADY_INVOKING", 502),
    ("Error_INVALID_INDEX", 503),
    ("Error_INVALID_LENGTH", 504),
    ("Error_INVALID_STRING", 506),
    ("Error_INVALID_CLASS_LOADER", 507),
    ("Error_INVALID_ARRAY", 508),
    ("Error_TRANSPORT_LOAD", 509),
    ("Error_TRANSPORT_INIT", 510),
    ("Error_NATIVE_METHOD", 511),
    ("Error_INVALID_COUNT", 512),
];
