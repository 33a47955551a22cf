/// BMP 文件的标准头部大小 (字节)。
/// 头部原样复制，隐写从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// BMP 头部中图像宽度字段的偏移量 (4 字节小端整数)。
pub const BMP_WIDTH_OFFSET: u64 = 18;

/// BMP 头部中图像高度字段的偏移量，紧跟在宽度之后。
pub const BMP_HEIGHT_OFFSET: u64 = 22;

/// 每个像素占用的颜色通道字节数 (24 位 BMP)。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 写在载体最前面的格式标记，解码时用于确认图像确实由本工具生成。
pub const MAGIC_STRING: &[u8] = b"#*";

/// 隐写一个字节所需的载体字节数，每个载体字节只存储 1 bit。
pub const BYTE_WINDOW: usize = 8;

/// 隐写一个 32 位长度字段所需的载体字节数。
pub const SIZE_WINDOW: usize = 32;

/// 扩展名的最大允许长度 (字节)，超过即视为格式错误。
pub const MAX_EXTENSION_LEN: usize = 32;

/// 未指定输出路径时，编码结果的默认文件名。
pub const DEFAULT_STEGO_NAME: &str = "default_stego.bmp";

/// 未指定输出路径时，解码结果的默认基础文件名 (扩展名由解码器补全)。
pub const DEFAULT_DECODED_NAME: &str = "decoded";

/// 载荷数据流式处理时每批读取的字节数。
pub const PAYLOAD_CHUNK: usize = 4096;
