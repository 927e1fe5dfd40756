//! Typed info handles over registered typelib buffers.
//!
//! An [`InfoRef`] is the lightweight view the resolution layer hands out:
//! shared ownership of the buffer, a byte offset, the blob-type tag, and an
//! optional container link for nested members (a field inside a struct, a
//! method inside an object). Typed wrappers decode their fixed-size blob
//! once at construction and expose structured accessors from then on.
//!
//! Handles share ownership of the buffer, so they stay readable after their
//! namespace is unregistered; they simply stop being reachable through
//! repository queries.

use std::sync::Arc;

use typelib_core::{
    ArgBlob, BlobType, BoxedBlob, CallbackBlob, ConstantBlob, DirEntry, Direction, EnumBlob,
    ErrorDomainBlob, FieldBlob, FieldFlags, FunctionBlob, FunctionFlags, InterfaceBlob,
    ObjectBlob, PropertyBlob, PropertyFlags, Record, Result, SignalBlob, SignalFlags,
    SignatureBlob, SimpleType, StructBlob, Transfer, TypeTag, Typelib, TypelibError, UnionBlob,
    VFuncBlob, VFuncFlags, ValueBlob, ValueFlags,
};

// ============================================================================
// Core view
// ============================================================================

/// A cheap-to-clone view of one blob inside a registered buffer.
#[derive(Clone)]
pub struct InfoRef {
    typelib: Arc<Typelib>,
    offset: u32,
    blob_type: BlobType,
    container: Option<Arc<InfoRef>>,
}

impl InfoRef {
    fn new(typelib: Arc<Typelib>, offset: u32, blob_type: BlobType) -> Self {
        InfoRef {
            typelib,
            offset,
            blob_type,
            container: None,
        }
    }

    fn nested(typelib: Arc<Typelib>, offset: u32, blob_type: BlobType, parent: InfoRef) -> Self {
        InfoRef {
            typelib,
            offset,
            blob_type,
            container: Some(Arc::new(parent)),
        }
    }

    /// The buffer this handle references.
    pub fn typelib(&self) -> &Arc<Typelib> {
        &self.typelib
    }

    /// The namespace the handle belongs to.
    pub fn namespace(&self) -> &str {
        self.typelib.namespace()
    }

    /// Byte offset of the blob inside its buffer.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn blob_type(&self) -> BlobType {
        self.blob_type
    }

    /// The enclosing construct for nested members, if any.
    pub fn container(&self) -> Option<&InfoRef> {
        self.container.as_deref()
    }

    /// Look up an annotation attached to this blob.
    pub fn attribute(&self, name: &str) -> Result<Option<&str>> {
        self.typelib.attribute(self.offset, name)
    }
}

impl std::fmt::Debug for InfoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoRef")
            .field("namespace", &self.namespace())
            .field("offset", &self.offset)
            .field("blob_type", &self.blob_type)
            .finish()
    }
}

/// Decoded four-byte type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDesc {
    pub tag: TypeTag,
    pub is_pointer: bool,
}

impl TypeDesc {
    fn decode(simple: SimpleType, offset: u32) -> Result<Self> {
        let tag = TypeTag::try_from(simple.tag).map_err(|_| TypelibError::InvalidTag {
            what: "type",
            raw: u32::from(simple.tag),
            offset,
        })?;
        Ok(TypeDesc {
            tag,
            is_pointer: simple.flags & SimpleType::FLAG_POINTER != 0 || tag.is_pointer_kind(),
        })
    }
}

fn decode_direction(raw: u8, offset: u32) -> Result<Direction> {
    Direction::try_from(raw).map_err(|_| TypelibError::InvalidTag {
        what: "direction",
        raw: u32::from(raw),
        offset,
    })
}

fn decode_transfer(raw: u8, offset: u32) -> Result<Transfer> {
    Transfer::try_from(raw).map_err(|_| TypelibError::InvalidTag {
        what: "transfer",
        raw: u32::from(raw),
        offset,
    })
}

// ============================================================================
// Top-level dispatch
// ============================================================================

/// A resolved top-level construct.
#[derive(Debug, Clone)]
pub enum Info {
    Function(FunctionInfo),
    Callback(CallbackInfo),
    Constant(ConstantInfo),
    ErrorDomain(ErrorDomainInfo),
    Struct(StructInfo),
    Boxed(BoxedInfo),
    Enum(EnumInfo),
    Flags(EnumInfo),
    Object(ObjectInfo),
    Interface(InterfaceInfo),
    Union(UnionInfo),
}

impl Info {
    /// Resolve a directory entry into a typed handle.
    pub(crate) fn from_dir_entry(typelib: &Arc<Typelib>, entry: DirEntry) -> Result<Info> {
        let blob_type =
            BlobType::try_from(entry.blob_type).map_err(|_| TypelibError::InvalidTag {
                what: "blob type",
                raw: u32::from(entry.blob_type),
                offset: entry.offset,
            })?;
        let typelib = typelib.clone();
        Ok(match blob_type {
            BlobType::Invalid => {
                return Err(TypelibError::InvalidTag {
                    what: "blob type",
                    raw: 0,
                    offset: entry.offset,
                });
            }
            BlobType::Function => Info::Function(FunctionInfo::new(typelib, entry.offset, None)?),
            BlobType::Callback => Info::Callback(CallbackInfo::new(typelib, entry.offset)?),
            BlobType::Constant => Info::Constant(ConstantInfo::new(typelib, entry.offset)?),
            BlobType::ErrorDomain => {
                Info::ErrorDomain(ErrorDomainInfo::new(typelib, entry.offset)?)
            }
            BlobType::Struct => Info::Struct(StructInfo::new(typelib, entry.offset)?),
            BlobType::Boxed => Info::Boxed(BoxedInfo::new(typelib, entry.offset)?),
            BlobType::Enum => Info::Enum(EnumInfo::new(typelib, entry.offset, BlobType::Enum)?),
            BlobType::Flags => Info::Flags(EnumInfo::new(typelib, entry.offset, BlobType::Flags)?),
            BlobType::Object => Info::Object(ObjectInfo::new(typelib, entry.offset)?),
            BlobType::Interface => Info::Interface(InterfaceInfo::new(typelib, entry.offset)?),
            BlobType::Union => Info::Union(UnionInfo::new(typelib, entry.offset)?),
        })
    }

    pub fn info(&self) -> &InfoRef {
        match self {
            Info::Function(i) => i.info(),
            Info::Callback(i) => i.info(),
            Info::Constant(i) => i.info(),
            Info::ErrorDomain(i) => i.info(),
            Info::Struct(i) => i.info(),
            Info::Boxed(i) => i.info(),
            Info::Enum(i) | Info::Flags(i) => i.info(),
            Info::Object(i) => i.info(),
            Info::Interface(i) => i.info(),
            Info::Union(i) => i.info(),
        }
    }

    pub fn name(&self) -> Result<&str> {
        match self {
            Info::Function(i) => i.name(),
            Info::Callback(i) => i.name(),
            Info::Constant(i) => i.name(),
            Info::ErrorDomain(i) => i.name(),
            Info::Struct(i) => i.name(),
            Info::Boxed(i) => i.name(),
            Info::Enum(i) | Info::Flags(i) => i.name(),
            Info::Object(i) => i.name(),
            Info::Interface(i) => i.name(),
            Info::Union(i) => i.name(),
        }
    }

    pub fn blob_type(&self) -> BlobType {
        self.info().blob_type()
    }

    pub fn as_function(&self) -> Option<&FunctionInfo> {
        match self {
            Info::Function(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructInfo> {
        match self {
            Info::Struct(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match self {
            Info::Enum(i) | Info::Flags(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectInfo> {
        match self {
            Info::Object(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_error_domain(&self) -> Option<&ErrorDomainInfo> {
        match self {
            Info::ErrorDomain(i) => Some(i),
            _ => None,
        }
    }
}

// ============================================================================
// Callables
// ============================================================================

/// A function, method or constructor.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    info: InfoRef,
    blob: FunctionBlob,
}

impl FunctionInfo {
    pub(crate) fn new(
        typelib: Arc<Typelib>,
        offset: u32,
        container: Option<InfoRef>,
    ) -> Result<Self> {
        let blob: FunctionBlob = typelib.record_at(offset)?;
        let info = match container {
            Some(parent) => InfoRef::nested(typelib, offset, BlobType::Function, parent),
            None => InfoRef::new(typelib, offset, BlobType::Function),
        };
        Ok(FunctionInfo { info, blob })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    /// The dynamic symbol implementing this function.
    pub fn symbol(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.symbol)
    }

    pub fn flags(&self) -> FunctionFlags {
        FunctionFlags::from_bits_truncate(self.blob.flags)
    }

    /// Whether the call takes an implicit leading instance pointer.
    pub fn is_method(&self) -> bool {
        self.flags().contains(FunctionFlags::METHOD)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags().contains(FunctionFlags::CONSTRUCTOR)
    }

    /// Whether the call takes an implicit trailing error-output slot.
    pub fn throws(&self) -> bool {
        self.flags().contains(FunctionFlags::THROWS)
    }

    pub fn signature(&self) -> Result<SignatureInfo> {
        SignatureInfo::new(
            self.info.typelib.clone(),
            self.blob.signature,
            self.info.clone(),
        )
    }
}

/// A named callable type.
#[derive(Debug, Clone)]
pub struct CallbackInfo {
    info: InfoRef,
    blob: CallbackBlob,
}

impl CallbackInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: CallbackBlob = typelib.record_at(offset)?;
        Ok(CallbackInfo {
            info: InfoRef::new(typelib, offset, BlobType::Callback),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn signature(&self) -> Result<SignatureInfo> {
        SignatureInfo::new(
            self.info.typelib.clone(),
            self.blob.signature,
            self.info.clone(),
        )
    }
}

/// A callable signature: return type plus declared parameters.
#[derive(Debug, Clone)]
pub struct SignatureInfo {
    info: InfoRef,
    blob: SignatureBlob,
}

impl SignatureInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: SignatureBlob = typelib.record_at(offset)?;
        Ok(SignatureInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn n_args(&self) -> u16 {
        self.blob.n_args
    }

    pub fn return_type(&self) -> Result<TypeDesc> {
        TypeDesc::decode(self.blob.return_type, self.info.offset)
    }

    pub fn return_transfer(&self) -> Result<Transfer> {
        decode_transfer(self.blob.return_transfer, self.info.offset)
    }

    /// The declared parameter at `index` (0-based declaration order).
    pub fn arg(&self, index: u16) -> Result<ArgInfo> {
        if index >= self.blob.n_args {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_args,
            });
        }
        let offset = self.info.offset
            + SignatureBlob::SIZE as u32
            + u32::from(index) * ArgBlob::SIZE as u32;
        ArgInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }

    /// All declared parameters in declaration order.
    pub fn args(&self) -> Result<Vec<ArgInfo>> {
        (0..self.blob.n_args).map(|i| self.arg(i)).collect()
    }
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ArgInfo {
    info: InfoRef,
    blob: ArgBlob,
}

impl ArgInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: ArgBlob = typelib.record_at(offset)?;
        Ok(ArgInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn direction(&self) -> Result<Direction> {
        decode_direction(self.blob.direction, self.info.offset)
    }

    pub fn transfer(&self) -> Result<Transfer> {
        decode_transfer(self.blob.transfer, self.info.offset)
    }

    pub fn type_desc(&self) -> Result<TypeDesc> {
        TypeDesc::decode(self.blob.arg_type, self.info.offset)
    }
}

// ============================================================================
// Values
// ============================================================================

/// A typed compile-time constant.
#[derive(Debug, Clone)]
pub struct ConstantInfo {
    info: InfoRef,
    blob: ConstantBlob,
}

/// A decoded constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Boolean(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
}

impl ConstantInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: ConstantBlob = typelib.record_at(offset)?;
        Ok(ConstantInfo {
            info: InfoRef::new(typelib, offset, BlobType::Constant),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn type_desc(&self) -> Result<TypeDesc> {
        TypeDesc::decode(self.blob.const_type, self.info.offset)
    }

    /// Decode the constant's value bytes from the owning buffer.
    pub fn value(&self) -> Result<ConstantValue> {
        let desc = self.type_desc()?;
        let expect = |width: usize| -> Result<&[u8]> {
            if usize::from(self.blob.size) != width {
                return Err(TypelibError::Corrupt {
                    reason: format!(
                        "constant of type {:?} has size {}, expected {width}",
                        desc.tag, self.blob.size
                    ),
                });
            }
            self.info.typelib.bytes(self.blob.offset, width)
        };
        macro_rules! read_num {
            ($ty:ty, $width:expr) => {{
                let bytes = expect($width)?;
                let array: [u8; $width] =
                    bytes.try_into().map_err(|_| TypelibError::Corrupt {
                        reason: "constant value truncated".into(),
                    })?;
                <$ty>::from_ne_bytes(array)
            }};
        }
        Ok(match desc.tag {
            TypeTag::Boolean => ConstantValue::Boolean(read_num!(i32, 4) != 0),
            TypeTag::Int8 => ConstantValue::Int8(read_num!(i8, 1)),
            TypeTag::UInt8 => ConstantValue::UInt8(read_num!(u8, 1)),
            TypeTag::Int16 => ConstantValue::Int16(read_num!(i16, 2)),
            TypeTag::UInt16 => ConstantValue::UInt16(read_num!(u16, 2)),
            TypeTag::Int32 | TypeTag::Enum => ConstantValue::Int32(read_num!(i32, 4)),
            TypeTag::UInt32 => ConstantValue::UInt32(read_num!(u32, 4)),
            TypeTag::Int64 => ConstantValue::Int64(read_num!(i64, 8)),
            TypeTag::UInt64 => ConstantValue::UInt64(read_num!(u64, 8)),
            TypeTag::Float => ConstantValue::Float(read_num!(f32, 4)),
            TypeTag::Double => ConstantValue::Double(read_num!(f64, 8)),
            TypeTag::String => {
                ConstantValue::String(self.info.typelib.string(self.blob.offset)?.to_string())
            }
            TypeTag::Void | TypeTag::Pointer => {
                return Err(TypelibError::Corrupt {
                    reason: format!("constant cannot have type {:?}", desc.tag),
                });
            }
        })
    }
}

/// An error domain and its contiguous code range.
#[derive(Debug, Clone)]
pub struct ErrorDomainInfo {
    info: InfoRef,
    blob: ErrorDomainBlob,
}

impl ErrorDomainInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: ErrorDomainBlob = typelib.record_at(offset)?;
        Ok(ErrorDomainInfo {
            info: InfoRef::new(typelib, offset, BlobType::ErrorDomain),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    /// Symbol yielding the domain's runtime quark.
    pub fn get_quark_symbol(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.get_quark)
    }

    pub fn first_code(&self) -> i32 {
        self.blob.first_code
    }

    pub fn n_codes(&self) -> u16 {
        self.blob.n_codes
    }

    /// Whether `code` falls inside this domain's declared range.
    pub fn contains(&self, code: i32) -> bool {
        let span = i64::from(self.blob.first_code) + i64::from(self.blob.n_codes);
        i64::from(code) >= i64::from(self.blob.first_code) && i64::from(code) < span
    }
}

// ============================================================================
// Registered types
// ============================================================================

/// A boxed opaque registered type.
#[derive(Debug, Clone)]
pub struct BoxedInfo {
    info: InfoRef,
    blob: BoxedBlob,
}

impl BoxedInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: BoxedBlob = typelib.record_at(offset)?;
        Ok(BoxedInfo {
            info: InfoRef::new(typelib, offset, BlobType::Boxed),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn gtype_symbol(&self) -> Result<Option<&str>> {
        self.info.typelib.optional_string(self.blob.gtype_symbol)
    }
}

/// An enumeration or flags type.
#[derive(Debug, Clone)]
pub struct EnumInfo {
    info: InfoRef,
    blob: EnumBlob,
}

impl EnumInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32, blob_type: BlobType) -> Result<Self> {
        let blob: EnumBlob = typelib.record_at(offset)?;
        Ok(EnumInfo {
            info: InfoRef::new(typelib, offset, blob_type),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn gtype_symbol(&self) -> Result<Option<&str>> {
        self.info.typelib.optional_string(self.blob.gtype_symbol)
    }

    pub fn is_flags(&self) -> bool {
        self.info.blob_type == BlobType::Flags
    }

    /// Storage kind the members are encoded with.
    pub fn storage(&self) -> Result<TypeTag> {
        TypeTag::try_from(self.blob.storage).map_err(|_| TypelibError::InvalidTag {
            what: "enum storage",
            raw: u32::from(self.blob.storage),
            offset: self.info.offset,
        })
    }

    pub fn n_values(&self) -> u16 {
        self.blob.n_values
    }

    pub fn value(&self, index: u16) -> Result<ValueInfo> {
        if index >= self.blob.n_values {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_values,
            });
        }
        let offset = self.blob.values + u32::from(index) * ValueBlob::SIZE as u32;
        ValueInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }

    pub fn value_by_name(&self, name: &str) -> Result<Option<ValueInfo>> {
        for index in 0..self.blob.n_values {
            let value = self.value(index)?;
            if value.name()? == name {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

/// One named member of an enum or flags type.
#[derive(Debug, Clone)]
pub struct ValueInfo {
    info: InfoRef,
    blob: ValueBlob,
}

impl ValueInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: ValueBlob = typelib.record_at(offset)?;
        Ok(ValueInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn value(&self) -> i32 {
        self.blob.value
    }

    /// The member value reinterpreted as unsigned, for UNSIGNED members.
    pub fn unsigned_value(&self) -> u32 {
        self.blob.value as u32
    }

    pub fn is_unsigned(&self) -> bool {
        ValueFlags::from_bits_truncate(self.blob.flags).contains(ValueFlags::UNSIGNED)
    }
}

/// A struct type and its field table.
#[derive(Debug, Clone)]
pub struct StructInfo {
    info: InfoRef,
    blob: StructBlob,
}

impl StructInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: StructBlob = typelib.record_at(offset)?;
        Ok(StructInfo {
            info: InfoRef::new(typelib, offset, BlobType::Struct),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn gtype_symbol(&self) -> Result<Option<&str>> {
        self.info.typelib.optional_string(self.blob.gtype_symbol)
    }

    /// Total byte size of the native struct.
    pub fn size(&self) -> u32 {
        self.blob.size
    }

    pub fn alignment(&self) -> u16 {
        self.blob.alignment
    }

    pub fn n_fields(&self) -> u16 {
        self.blob.n_fields
    }

    pub fn field(&self, index: u16) -> Result<FieldInfo> {
        if index >= self.blob.n_fields {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_fields,
            });
        }
        let offset = self.blob.fields + u32::from(index) * FieldBlob::SIZE as u32;
        FieldInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }

    pub fn field_by_name(&self, name: &str) -> Result<Option<FieldInfo>> {
        for index in 0..self.blob.n_fields {
            let field = self.field(index)?;
            if field.name()? == name {
                return Ok(Some(field));
            }
        }
        Ok(None)
    }
}

/// A union type; shares the struct layout.
#[derive(Debug, Clone)]
pub struct UnionInfo {
    info: InfoRef,
    blob: UnionBlob,
}

impl UnionInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: UnionBlob = typelib.record_at(offset)?;
        Ok(UnionInfo {
            info: InfoRef::new(typelib, offset, BlobType::Union),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn gtype_symbol(&self) -> Result<Option<&str>> {
        self.info.typelib.optional_string(self.blob.gtype_symbol)
    }

    pub fn size(&self) -> u32 {
        self.blob.size
    }

    pub fn alignment(&self) -> u16 {
        self.blob.alignment
    }

    pub fn n_fields(&self) -> u16 {
        self.blob.n_fields
    }

    pub fn field(&self, index: u16) -> Result<FieldInfo> {
        if index >= self.blob.n_fields {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_fields,
            });
        }
        let offset = self.blob.fields + u32::from(index) * FieldBlob::SIZE as u32;
        FieldInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }
}

/// One field of a struct or union.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    info: InfoRef,
    blob: FieldBlob,
}

impl FieldInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: FieldBlob = typelib.record_at(offset)?;
        Ok(FieldInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    /// Byte offset of the field inside the native struct.
    pub fn struct_offset(&self) -> u32 {
        self.blob.struct_offset
    }

    pub fn flags(&self) -> FieldFlags {
        FieldFlags::from_bits_truncate(self.blob.flags)
    }

    pub fn type_desc(&self) -> Result<TypeDesc> {
        TypeDesc::decode(self.blob.field_type, self.info.offset)
    }
}

/// An object (class) type.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    info: InfoRef,
    blob: ObjectBlob,
}

impl ObjectInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: ObjectBlob = typelib.record_at(offset)?;
        Ok(ObjectInfo {
            info: InfoRef::new(typelib, offset, BlobType::Object),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn gtype_symbol(&self) -> Result<Option<&str>> {
        self.info.typelib.optional_string(self.blob.gtype_symbol)
    }

    /// The parent object, resolved through the directory.
    pub fn parent(&self) -> Result<Option<ObjectInfo>> {
        if self.blob.parent == 0 {
            return Ok(None);
        }
        let entry = self.info.typelib.dir_entry(self.blob.parent)?;
        if entry.blob_type != u16::from(BlobType::Object) {
            return Err(TypelibError::Corrupt {
                reason: format!(
                    "parent entry {} of object at {:#x} is not an object",
                    self.blob.parent, self.info.offset
                ),
            });
        }
        ObjectInfo::new(self.info.typelib.clone(), entry.offset).map(Some)
    }

    /// The class struct describing this object's vtable layout, if any.
    pub fn class_struct(&self) -> Result<Option<StructInfo>> {
        if self.blob.class_struct == 0 {
            return Ok(None);
        }
        let index = u16::try_from(self.blob.class_struct).map_err(|_| TypelibError::Corrupt {
            reason: format!(
                "class struct index {} of object at {:#x} exceeds the directory",
                self.blob.class_struct, self.info.offset
            ),
        })?;
        let entry = self.info.typelib.dir_entry(index)?;
        if entry.blob_type != u16::from(BlobType::Struct) {
            return Err(TypelibError::Corrupt {
                reason: format!(
                    "class struct entry {} of object at {:#x} is not a struct",
                    self.blob.class_struct, self.info.offset
                ),
            });
        }
        StructInfo::new(self.info.typelib.clone(), entry.offset).map(Some)
    }

    pub fn n_methods(&self) -> u16 {
        self.blob.n_methods
    }

    pub fn n_properties(&self) -> u16 {
        self.blob.n_properties
    }

    pub fn n_signals(&self) -> u16 {
        self.blob.n_signals
    }

    pub fn n_vfuncs(&self) -> u16 {
        self.blob.n_vfuncs
    }

    // Member groups are laid out contiguously at `members`, in declaration
    // groups: methods, properties, signals, vfuncs.

    fn methods_offset(&self) -> u32 {
        self.blob.members
    }

    fn properties_offset(&self) -> u32 {
        self.methods_offset() + u32::from(self.blob.n_methods) * FunctionBlob::SIZE as u32
    }

    fn signals_offset(&self) -> u32 {
        self.properties_offset() + u32::from(self.blob.n_properties) * PropertyBlob::SIZE as u32
    }

    fn vfuncs_offset(&self) -> u32 {
        self.signals_offset() + u32::from(self.blob.n_signals) * SignalBlob::SIZE as u32
    }

    pub fn method(&self, index: u16) -> Result<FunctionInfo> {
        if index >= self.blob.n_methods {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_methods,
            });
        }
        let offset = self.methods_offset() + u32::from(index) * FunctionBlob::SIZE as u32;
        FunctionInfo::new(self.info.typelib.clone(), offset, Some(self.info.clone()))
    }

    pub fn method_by_name(&self, name: &str) -> Result<Option<FunctionInfo>> {
        for index in 0..self.blob.n_methods {
            let method = self.method(index)?;
            if method.name()? == name {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }

    pub fn property(&self, index: u16) -> Result<PropertyInfo> {
        if index >= self.blob.n_properties {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_properties,
            });
        }
        let offset = self.properties_offset() + u32::from(index) * PropertyBlob::SIZE as u32;
        PropertyInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }

    pub fn signal(&self, index: u16) -> Result<SignalInfo> {
        if index >= self.blob.n_signals {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_signals,
            });
        }
        let offset = self.signals_offset() + u32::from(index) * SignalBlob::SIZE as u32;
        SignalInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }

    pub fn vfunc(&self, index: u16) -> Result<VFuncInfo> {
        if index >= self.blob.n_vfuncs {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_vfuncs,
            });
        }
        let offset = self.vfuncs_offset() + u32::from(index) * VFuncBlob::SIZE as u32;
        VFuncInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }
}

/// An interface type.
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    info: InfoRef,
    blob: InterfaceBlob,
}

impl InterfaceInfo {
    pub(crate) fn new(typelib: Arc<Typelib>, offset: u32) -> Result<Self> {
        let blob: InterfaceBlob = typelib.record_at(offset)?;
        Ok(InterfaceInfo {
            info: InfoRef::new(typelib, offset, BlobType::Interface),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn gtype_symbol(&self) -> Result<Option<&str>> {
        self.info.typelib.optional_string(self.blob.gtype_symbol)
    }

    pub fn n_methods(&self) -> u16 {
        self.blob.n_methods
    }

    pub fn n_vfuncs(&self) -> u16 {
        self.blob.n_vfuncs
    }

    pub fn method(&self, index: u16) -> Result<FunctionInfo> {
        if index >= self.blob.n_methods {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_methods,
            });
        }
        let offset = self.blob.members + u32::from(index) * FunctionBlob::SIZE as u32;
        FunctionInfo::new(self.info.typelib.clone(), offset, Some(self.info.clone()))
    }

    pub fn vfunc(&self, index: u16) -> Result<VFuncInfo> {
        if index >= self.blob.n_vfuncs {
            return Err(TypelibError::IndexOutOfRange {
                index,
                max: self.blob.n_vfuncs,
            });
        }
        let offset = self.blob.members
            + u32::from(self.blob.n_methods) * FunctionBlob::SIZE as u32
            + u32::from(index) * VFuncBlob::SIZE as u32;
        VFuncInfo::new(self.info.typelib.clone(), offset, self.info.clone())
    }
}

// ============================================================================
// Nested members
// ============================================================================

/// One property of an object.
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    info: InfoRef,
    blob: PropertyBlob,
}

impl PropertyInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: PropertyBlob = typelib.record_at(offset)?;
        Ok(PropertyInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn flags(&self) -> PropertyFlags {
        PropertyFlags::from_bits_truncate(self.blob.flags)
    }

    pub fn transfer(&self) -> Result<Transfer> {
        decode_transfer(self.blob.transfer, self.info.offset)
    }

    pub fn type_desc(&self) -> Result<TypeDesc> {
        TypeDesc::decode(self.blob.prop_type, self.info.offset)
    }
}

/// One signal of an object.
#[derive(Debug, Clone)]
pub struct SignalInfo {
    info: InfoRef,
    blob: SignalBlob,
}

impl SignalInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: SignalBlob = typelib.record_at(offset)?;
        Ok(SignalInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn flags(&self) -> SignalFlags {
        SignalFlags::from_bits_truncate(self.blob.flags)
    }

    pub fn signature(&self) -> Result<SignatureInfo> {
        SignatureInfo::new(
            self.info.typelib.clone(),
            self.blob.signature,
            self.info.clone(),
        )
    }
}

/// One virtual function of an object or interface.
#[derive(Debug, Clone)]
pub struct VFuncInfo {
    info: InfoRef,
    blob: VFuncBlob,
}

impl VFuncInfo {
    fn new(typelib: Arc<Typelib>, offset: u32, parent: InfoRef) -> Result<Self> {
        let blob: VFuncBlob = typelib.record_at(offset)?;
        Ok(VFuncInfo {
            info: InfoRef::nested(typelib, offset, parent.blob_type(), parent),
            blob,
        })
    }

    pub fn info(&self) -> &InfoRef {
        &self.info
    }

    pub fn name(&self) -> Result<&str> {
        self.info.typelib.string(self.blob.name)
    }

    pub fn flags(&self) -> VFuncFlags {
        VFuncFlags::from_bits_truncate(self.blob.flags)
    }

    /// Byte offset of the function pointer inside the class struct.
    pub fn struct_offset(&self) -> u16 {
        self.blob.struct_offset
    }

    pub fn signature(&self) -> Result<SignatureInfo> {
        SignatureInfo::new(
            self.info.typelib.clone(),
            self.blob.signature,
            self.info.clone(),
        )
    }
}
