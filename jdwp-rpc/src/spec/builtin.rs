// Built-in JDWP specification
//
// The subset of the JDWP command sets a debugger front-end needs day to day.
// Field names follow the JDWP specification document.

use super::{
    arg, command, group, repeat, simple, variant, Command, CommandSet, Constant, ConstantSet,
    EventComposite, RepeatElement, ResponseShape, Select, Specification, WireType as W,
};
use crate::commands::*;

pub fn specification() -> Specification {
    Specification {
        command_sets: vec![
            virtual_machine(),
            reference_type(),
            class_type(),
            method(),
            object_reference(),
            string_reference(),
            thread_reference(),
            thread_group_reference(),
            array_reference(),
            event_request(),
            stack_frame(),
            event(),
        ],
        constant_sets: constant_sets(),
    }
}

fn set(id: u8, name: &str, commands: Vec<Command>) -> CommandSet {
    CommandSet {
        id,
        name: name.to_string(),
        commands,
    }
}

fn virtual_machine() -> CommandSet {
    use vm_commands::*;
    set(
        command_sets::VIRTUAL_MACHINE,
        "VirtualMachine",
        vec![
            command(
                VERSION,
                "Version",
                vec![],
                vec![
                    arg("description", W::String),
                    arg("jdwpMajor", W::Int),
                    arg("jdwpMinor", W::Int),
                    arg("vmVersion", W::String),
                    arg("vmName", W::String),
                ],
            ),
            command(
                CLASSES_BY_SIGNATURE,
                "ClassesBySignature",
                vec![arg("signature", W::String)],
                vec![repeat(
                    "classes",
                    RepeatElement::Group(group(vec![
                        simple("refTypeTag", W::Byte),
                        simple("typeID", W::ReferenceTypeId),
                        simple("status", W::Int),
                    ])),
                )],
            ),
            command(
                ALL_CLASSES,
                "AllClasses",
                vec![],
                vec![repeat(
                    "classes",
                    RepeatElement::Group(group(vec![
                        simple("refTypeTag", W::Byte),
                        simple("typeID", W::ReferenceTypeId),
                        simple("signature", W::String),
                        simple("status", W::Int),
                    ])),
                )],
            ),
            command(
                ALL_THREADS,
                "AllThreads",
                vec![],
                vec![repeat("threads", RepeatElement::Simple(simple("thread", W::ObjectId)))],
            ),
            command(
                TOP_LEVEL_THREAD_GROUPS,
                "TopLevelThreadGroups",
                vec![],
                vec![repeat("groups", RepeatElement::Simple(simple("group", W::ObjectId)))],
            ),
            command(DISPOSE, "Dispose", vec![], vec![]),
            command(
                ID_SIZES,
                "IDSizes",
                vec![],
                vec![
                    arg("fieldIDSize", W::Int),
                    arg("methodIDSize", W::Int),
                    arg("objectIDSize", W::Int),
                    arg("referenceTypeIDSize", W::Int),
                    arg("frameIDSize", W::Int),
                ],
            ),
            command(SUSPEND, "Suspend", vec![], vec![]),
            command(RESUME, "Resume", vec![], vec![]),
            command(EXIT, "Exit", vec![arg("exitCode", W::Int)], vec![]),
            command(
                CREATE_STRING,
                "CreateString",
                vec![arg("utf", W::String)],
                vec![arg("stringObject", W::ObjectId)],
            ),
            command(
                CAPABILITIES,
                "Capabilities",
                vec![],
                vec![
                    arg("canWatchFieldModification", W::Boolean),
                    arg("canWatchFieldAccess", W::Boolean),
                    arg("canGetBytecodes", W::Boolean),
                    arg("canGetSyntheticAttribute", W::Boolean),
                    arg("canGetOwnedMonitorInfo", W::Boolean),
                    arg("canGetCurrentContendedMonitor", W::Boolean),
                    arg("canGetMonitorInfo", W::Boolean),
                ],
            ),
            command(
                CLASS_PATHS,
                "ClassPaths",
                vec![],
                vec![
                    arg("baseDir", W::String),
                    repeat("classpaths", RepeatElement::Simple(simple("path", W::String))),
                    repeat("bootclasspaths", RepeatElement::Simple(simple("path", W::String))),
                ],
            ),
            command(
                DISPOSE_OBJECTS,
                "DisposeObjects",
                vec![repeat(
                    "requests",
                    RepeatElement::Group(group(vec![
                        simple("object", W::ObjectId),
                        simple("refCnt", W::Int),
                    ])),
                )],
                vec![],
            ),
            command(HOLD_EVENTS, "HoldEvents", vec![], vec![]),
            command(RELEASE_EVENTS, "ReleaseEvents", vec![], vec![]),
        ],
    )
}

fn reference_type() -> CommandSet {
    use reference_type_commands::*;
    let member = |id_name: &str, id_type: W| {
        RepeatElement::Group(group(vec![
            simple(id_name, id_type),
            simple("name", W::String),
            simple("signature", W::String),
            simple("modBits", W::Int),
        ]))
    };
    set(
        command_sets::REFERENCE_TYPE,
        "ReferenceType",
        vec![
            command(
                SIGNATURE,
                "Signature",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![arg("signature", W::String)],
            ),
            command(
                CLASS_LOADER,
                "ClassLoader",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![arg("classLoader", W::ObjectId)],
            ),
            command(
                MODIFIERS,
                "Modifiers",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![arg("modBits", W::Int)],
            ),
            command(
                FIELDS,
                "Fields",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![repeat("declared", member("fieldID", W::FieldId))],
            ),
            command(
                METHODS,
                "Methods",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![repeat("declared", member("methodID", W::MethodId))],
            ),
            command(
                GET_VALUES,
                "GetValues",
                vec![
                    arg("refType", W::ReferenceTypeId),
                    repeat("fields", RepeatElement::Simple(simple("fieldID", W::FieldId))),
                ],
                vec![repeat("values", RepeatElement::Simple(simple("value", W::Value)))],
            ),
            command(
                SOURCE_FILE,
                "SourceFile",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![arg("sourceFile", W::String)],
            ),
            command(
                STATUS,
                "Status",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![arg("status", W::Int)],
            ),
            command(
                INTERFACES,
                "Interfaces",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![repeat(
                    "interfaces",
                    RepeatElement::Simple(simple("interfaceType", W::ReferenceTypeId)),
                )],
            ),
            command(
                CLASS_OBJECT,
                "ClassObject",
                vec![arg("refType", W::ReferenceTypeId)],
                vec![arg("classObject", W::ObjectId)],
            ),
        ],
    )
}

fn class_type() -> CommandSet {
    set(
        command_sets::CLASS_TYPE,
        "ClassType",
        vec![command(
            class_type_commands::SUPERCLASS,
            "Superclass",
            vec![arg("clazz", W::ReferenceTypeId)],
            vec![arg("superclass", W::ReferenceTypeId)],
        )],
    )
}

fn method() -> CommandSet {
    use method_commands::*;
    let method_key = || vec![arg("refType", W::ReferenceTypeId), arg("methodID", W::MethodId)];
    set(
        command_sets::METHOD,
        "Method",
        vec![
            command(
                LINE_TABLE,
                "LineTable",
                method_key(),
                vec![
                    arg("start", W::Long),
                    arg("end", W::Long),
                    repeat(
                        "lines",
                        RepeatElement::Group(group(vec![
                            simple("lineCodeIndex", W::Long),
                            simple("lineNumber", W::Int),
                        ])),
                    ),
                ],
            ),
            command(
                VARIABLE_TABLE,
                "VariableTable",
                method_key(),
                vec![
                    arg("argCnt", W::Int),
                    repeat(
                        "slots",
                        RepeatElement::Group(group(vec![
                            simple("codeIndex", W::Long),
                            simple("name", W::String),
                            simple("signature", W::String),
                            simple("length", W::Int),
                            simple("slot", W::Int),
                        ])),
                    ),
                ],
            ),
            command(
                BYTECODES,
                "Bytecodes",
                method_key(),
                vec![repeat("bytes", RepeatElement::Simple(simple("bytecode", W::Byte)))],
            ),
        ],
    )
}

fn object_reference() -> CommandSet {
    use object_reference_commands::*;
    set(
        command_sets::OBJECT_REFERENCE,
        "ObjectReference",
        vec![
            command(
                REFERENCE_TYPE,
                "ReferenceType",
                vec![arg("object", W::ObjectId)],
                vec![arg("refTypeTag", W::Byte), arg("typeID", W::ReferenceTypeId)],
            ),
            command(
                GET_VALUES,
                "GetValues",
                vec![
                    arg("object", W::ObjectId),
                    repeat("fields", RepeatElement::Simple(simple("fieldID", W::FieldId))),
                ],
                vec![repeat("values", RepeatElement::Simple(simple("value", W::Value)))],
            ),
        ],
    )
}

fn string_reference() -> CommandSet {
    set(
        command_sets::STRING_REFERENCE,
        "StringReference",
        vec![command(
            string_reference_commands::VALUE,
            "Value",
            vec![arg("stringObject", W::ObjectId)],
            vec![arg("stringValue", W::String)],
        )],
    )
}

fn thread_reference() -> CommandSet {
    use thread_commands::*;
    let thread = || vec![arg("thread", W::ObjectId)];
    set(
        command_sets::THREAD_REFERENCE,
        "ThreadReference",
        vec![
            command(NAME, "Name", thread(), vec![arg("threadName", W::String)]),
            command(SUSPEND, "Suspend", thread(), vec![]),
            command(RESUME, "Resume", thread(), vec![]),
            command(
                STATUS,
                "Status",
                thread(),
                vec![arg("threadStatus", W::Int), arg("suspendStatus", W::Int)],
            ),
            command(THREAD_GROUP, "ThreadGroup", thread(), vec![arg("group", W::ObjectId)]),
            command(
                FRAMES,
                "Frames",
                vec![
                    arg("thread", W::ObjectId),
                    arg("startFrame", W::Int),
                    arg("length", W::Int),
                ],
                vec![repeat(
                    "frames",
                    RepeatElement::Group(group(vec![
                        simple("frameID", W::FrameId),
                        simple("location", W::Location),
                    ])),
                )],
            ),
            command(FRAME_COUNT, "FrameCount", thread(), vec![arg("frameCount", W::Int)]),
            command(
                SUSPEND_COUNT,
                "SuspendCount",
                thread(),
                vec![arg("suspendCount", W::Int)],
            ),
        ],
    )
}

fn thread_group_reference() -> CommandSet {
    set(
        command_sets::THREAD_GROUP_REFERENCE,
        "ThreadGroupReference",
        vec![command(
            thread_group_commands::NAME,
            "Name",
            vec![arg("group", W::ObjectId)],
            vec![arg("groupName", W::String)],
        )],
    )
}

fn array_reference() -> CommandSet {
    set(
        command_sets::ARRAY_REFERENCE,
        "ArrayReference",
        vec![command(
            array_reference_commands::LENGTH,
            "Length",
            vec![arg("arrayObject", W::ObjectId)],
            vec![arg("arrayLength", W::Int)],
        )],
    )
}

fn event_request() -> CommandSet {
    use event_commands::*;
    use mod_kinds::*;
    let modifiers = Select {
        discriminant: simple("modKind", W::Byte),
        variants: vec![
            variant(COUNT as i64, "Count", vec![simple("count", W::Int)]),
            variant(CONDITIONAL as i64, "Conditional", vec![simple("exprID", W::Int)]),
            variant(THREAD_ONLY as i64, "ThreadOnly", vec![simple("thread", W::ObjectId)]),
            variant(CLASS_ONLY as i64, "ClassOnly", vec![simple("clazz", W::ReferenceTypeId)]),
            variant(CLASS_MATCH as i64, "ClassMatch", vec![simple("classPattern", W::String)]),
            variant(
                CLASS_EXCLUDE as i64,
                "ClassExclude",
                vec![simple("classPattern", W::String)],
            ),
            variant(LOCATION_ONLY as i64, "LocationOnly", vec![simple("loc", W::Location)]),
            variant(
                EXCEPTION_ONLY as i64,
                "ExceptionOnly",
                vec![
                    simple("exceptionOrNull", W::ReferenceTypeId),
                    simple("caught", W::Boolean),
                    simple("uncaught", W::Boolean),
                ],
            ),
            variant(
                FIELD_ONLY as i64,
                "FieldOnly",
                vec![simple("declaring", W::ReferenceTypeId), simple("fieldID", W::FieldId)],
            ),
            variant(
                STEP as i64,
                "Step",
                vec![
                    simple("thread", W::ObjectId),
                    simple("size", W::Int),
                    simple("depth", W::Int),
                ],
            ),
            variant(INSTANCE_ONLY as i64, "InstanceOnly", vec![simple("instance", W::ObjectId)]),
            variant(
                SOURCE_NAME_MATCH as i64,
                "SourceNameMatch",
                vec![simple("sourceNamePattern", W::String)],
            ),
        ],
    };
    set(
        command_sets::EVENT_REQUEST,
        "EventRequest",
        vec![
            command(
                SET,
                "Set",
                vec![
                    arg("eventKind", W::Byte),
                    arg("suspendPolicy", W::Byte),
                    repeat("modifiers", RepeatElement::Select(modifiers)),
                ],
                vec![arg("requestID", W::Int)],
            ),
            command(
                CLEAR,
                "Clear",
                vec![arg("eventKind", W::Byte), arg("requestID", W::Int)],
                vec![],
            ),
            command(CLEAR_ALL_BREAKPOINTS, "ClearAllBreakpoints", vec![], vec![]),
        ],
    )
}

fn stack_frame() -> CommandSet {
    use stack_frame_commands::*;
    set(
        command_sets::STACK_FRAME,
        "StackFrame",
        vec![
            command(
                GET_VALUES,
                "GetValues",
                vec![
                    arg("thread", W::ObjectId),
                    arg("frame", W::FrameId),
                    repeat(
                        "slots",
                        RepeatElement::Group(group(vec![
                            simple("slot", W::Int),
                            simple("sigbyte", W::Byte),
                        ])),
                    ),
                ],
                vec![repeat("values", RepeatElement::Simple(simple("slotValue", W::Value)))],
            ),
            command(
                THIS_OBJECT,
                "ThisObject",
                vec![arg("thread", W::ObjectId), arg("frame", W::FrameId)],
                vec![arg("objectThis", W::TaggedObjectId)],
            ),
        ],
    )
}

fn event() -> CommandSet {
    use event_kinds::*;
    let request_id = || simple("requestID", W::Int);
    let thread = || simple("thread", W::ObjectId);
    let location = || simple("location", W::Location);
    let located = |kind: u8, name: &str| {
        variant(kind as i64, name, vec![request_id(), thread(), location()])
    };

    let events = Select {
        discriminant: simple("eventKind", W::Byte),
        variants: vec![
            located(SINGLE_STEP, "SingleStep"),
            located(BREAKPOINT, "Breakpoint"),
            located(METHOD_ENTRY, "MethodEntry"),
            located(METHOD_EXIT, "MethodExit"),
            variant(
                METHOD_EXIT_WITH_RETURN_VALUE as i64,
                "MethodExitWithReturnValue",
                vec![request_id(), thread(), location(), simple("value", W::Value)],
            ),
            variant(
                MONITOR_CONTENDED_ENTER as i64,
                "MonitorContendedEnter",
                vec![request_id(), thread(), simple("object", W::TaggedObjectId), location()],
            ),
            variant(
                MONITOR_CONTENDED_ENTERED as i64,
                "MonitorContendedEntered",
                vec![request_id(), thread(), simple("object", W::TaggedObjectId), location()],
            ),
            variant(
                MONITOR_WAIT as i64,
                "MonitorWait",
                vec![
                    request_id(),
                    thread(),
                    simple("object", W::TaggedObjectId),
                    location(),
                    simple("timeout", W::Long),
                ],
            ),
            variant(
                MONITOR_WAITED as i64,
                "MonitorWaited",
                vec![
                    request_id(),
                    thread(),
                    simple("object", W::TaggedObjectId),
                    location(),
                    simple("timed_out", W::Boolean),
                ],
            ),
            variant(
                EXCEPTION as i64,
                "Exception",
                vec![
                    request_id(),
                    thread(),
                    location(),
                    simple("exception", W::TaggedObjectId),
                    simple("catchLocation", W::Location),
                ],
            ),
            variant(THREAD_START as i64, "ThreadStart", vec![request_id(), thread()]),
            variant(THREAD_DEATH as i64, "ThreadDeath", vec![request_id(), thread()]),
            variant(
                CLASS_PREPARE as i64,
                "ClassPrepare",
                vec![
                    request_id(),
                    thread(),
                    simple("refTypeTag", W::Byte),
                    simple("typeID", W::ReferenceTypeId),
                    simple("signature", W::String),
                    simple("status", W::Int),
                ],
            ),
            variant(
                CLASS_UNLOAD as i64,
                "ClassUnload",
                vec![request_id(), simple("signature", W::String)],
            ),
            variant(
                FIELD_ACCESS as i64,
                "FieldAccess",
                vec![
                    request_id(),
                    thread(),
                    location(),
                    simple("refTypeTag", W::Byte),
                    simple("typeID", W::ReferenceTypeId),
                    simple("fieldID", W::FieldId),
                    simple("object", W::TaggedObjectId),
                ],
            ),
            variant(
                FIELD_MODIFICATION as i64,
                "FieldModification",
                vec![
                    request_id(),
                    thread(),
                    location(),
                    simple("refTypeTag", W::Byte),
                    simple("typeID", W::ReferenceTypeId),
                    simple("fieldID", W::FieldId),
                    simple("object", W::TaggedObjectId),
                    simple("valueToBe", W::Value),
                ],
            ),
            variant(VM_START as i64, "VMStart", vec![request_id(), thread()]),
            variant(VM_DEATH as i64, "VMDeath", vec![request_id()]),
        ],
    };

    set(
        command_sets::EVENT,
        "Event",
        vec![Command {
            id: event_set_commands::COMPOSITE,
            name: "Composite".to_string(),
            request: vec![],
            response: ResponseShape::Events(EventComposite { events }),
        }],
    )
}

fn constants(name: &str, values: &[(&str, i64)]) -> ConstantSet {
    ConstantSet {
        name: name.to_string(),
        constants: values
            .iter()
            .map(|(n, v)| Constant {
                name: n.to_string(),
                value: *v,
            })
            .collect(),
    }
}

fn constant_sets() -> Vec<ConstantSet> {
    use event_kinds::*;
    vec![
        // Error must stay first
        constants("Error", ERROR_CONSTANTS),
        constants(
            "EventKind",
            &[
                ("SINGLE_STEP", SINGLE_STEP as i64),
                ("BREAKPOINT", BREAKPOINT as i64),
                ("FRAME_POP", FRAME_POP as i64),
                ("EXCEPTION", EXCEPTION as i64),
                ("USER_DEFINED", USER_DEFINED as i64),
                ("THREAD_START", THREAD_START as i64),
                ("THREAD_DEATH", THREAD_DEATH as i64),
                ("CLASS_PREPARE", CLASS_PREPARE as i64),
                ("CLASS_UNLOAD", CLASS_UNLOAD as i64),
                ("CLASS_LOAD", CLASS_LOAD as i64),
                ("FIELD_ACCESS", FIELD_ACCESS as i64),
                ("FIELD_MODIFICATION", FIELD_MODIFICATION as i64),
                ("EXCEPTION_CATCH", EXCEPTION_CATCH as i64),
                ("METHOD_ENTRY", METHOD_ENTRY as i64),
                ("METHOD_EXIT", METHOD_EXIT as i64),
                ("METHOD_EXIT_WITH_RETURN_VALUE", METHOD_EXIT_WITH_RETURN_VALUE as i64),
                ("MONITOR_CONTENDED_ENTER", MONITOR_CONTENDED_ENTER as i64),
                ("MONITOR_CONTENDED_ENTERED", MONITOR_CONTENDED_ENTERED as i64),
                ("MONITOR_WAIT", MONITOR_WAIT as i64),
                ("MONITOR_WAITED", MONITOR_WAITED as i64),
                ("VM_START", VM_START as i64),
                ("VM_DEATH", VM_DEATH as i64),
            ],
        ),
        constants(
            "SuspendPolicy",
            &[
                ("NONE", suspend_policy::NONE as i64),
                ("EVENT_THREAD", suspend_policy::EVENT_THREAD as i64),
                ("ALL", suspend_policy::ALL as i64),
            ],
        ),
        constants(
            "TypeTag",
            &[
                ("CLASS", type_tags::CLASS as i64),
                ("INTERFACE", type_tags::INTERFACE as i64),
                ("ARRAY", type_tags::ARRAY as i64),
            ],
        ),
        constants(
            "Tag",
            &[
                ("ARRAY", b'[' as i64),
                ("BYTE", b'B' as i64),
                ("CHAR", b'C' as i64),
                ("OBJECT", b'L' as i64),
                ("FLOAT", b'F' as i64),
                ("DOUBLE", b'D' as i64),
                ("INT", b'I' as i64),
                ("LONG", b'J' as i64),
                ("SHORT", b'S' as i64),
                ("VOID", b'V' as i64),
                ("BOOLEAN", b'Z' as i64),
                ("STRING", b's' as i64),
                ("THREAD", b't' as i64),
                ("THREAD_GROUP", b'g' as i64),
                ("CLASS_LOADER", b'l' as i64),
                ("CLASS_OBJECT", b'c' as i64),
            ],
        ),
        constants(
            "StepDepth",
            &[
                ("INTO", step_depths::INTO as i64),
                ("OVER", step_depths::OVER as i64),
                ("OUT", step_depths::OUT as i64),
            ],
        ),
        constants(
            "StepSize",
            &[("MIN", step_sizes::MIN as i64), ("LINE", step_sizes::LINE as i64)],
        ),
        constants(
            "ThreadStatus",
            &[
                ("ZOMBIE", 0),
                ("RUNNING", 1),
                ("SLEEPING", 2),
                ("MONITOR", 3),
                ("WAIT", 4),
            ],
        ),
        constants("SuspendStatus", &[("SUSPEND_STATUS_SUSPENDED", 1)]),
        constants(
            "ClassStatus",
            &[("VERIFIED", 1), ("PREPARED", 2), ("INITIALIZED", 4), ("ERROR", 8)],
        ),
        constants(
            "ModKind",
            &[
                ("Count", mod_kinds::COUNT as i64),
                ("Conditional", mod_kinds::CONDITIONAL as i64),
                ("ThreadOnly", mod_kinds::THREAD_ONLY as i64),
                ("ClassOnly", mod_kinds::CLASS_ONLY as i64),
                ("ClassMatch", mod_kinds::CLASS_MATCH as i64),
                ("ClassExclude", mod_kinds::CLASS_EXCLUDE as i64),
                ("LocationOnly", mod_kinds::LOCATION_ONLY as i64),
                ("ExceptionOnly", mod_kinds::EXCEPTION_ONLY as i64),
                ("FieldOnly", mod_kinds::FIELD_ONLY as i64),
                ("Step", mod_kinds::STEP as i64),
                ("InstanceOnly", mod_kinds::INSTANCE_ONLY as i64),
                ("SourceNameMatch", mod_kinds::SOURCE_NAME_MATCH as i64),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_set_comes_first() {
        let spec = specification();
        let errors = spec.error_constants().unwrap();
        assert_eq!(errors.name, "Error");
        assert!(errors.constants.iter().any(|c| c.value == 41));
    }

    #[test]
    fn test_event_set_is_composite() {
        let spec = specification();
        let event = spec.command_set("Event").unwrap();
        assert_eq!(event.id, 64);
        assert!(matches!(event.commands[0].response, ResponseShape::Events(_)));
    }
}
