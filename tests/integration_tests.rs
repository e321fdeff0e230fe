use bit_raster::{
    BitSequence, Content, Error, Options, PageSize, Salt,
    cli::{DecodeFileArgs, DecodeTextArgs, EncodeArgs},
    constants::INVALID_SALT_MESSAGE,
    decode_file, decode_text, encode,
    handler::{handle_decode_file, handle_decode_text, handle_encode_file, handle_encode_text},
};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 一个辅助函数，用于生成指定长度的随机 7 位 ASCII 文本
fn random_ascii(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.random_range(0..128u8)))
        .collect()
}

/// 一个辅助函数，把 0..256 的整数展开为对应的盐值 (第 n 位为 1 表示包含偏移 n)
fn salt_from_mask(mask: u32) -> Salt {
    Salt::new((0..8).filter(|offset| mask & (1u32 << *offset) != 0))
}

fn encode_args(input: &Path, dest: Option<PathBuf>) -> EncodeArgs {
    EncodeArgs {
        input: input.to_path_buf(),
        dest,
        salt: None,
        width: None,
        height: None,
        force: false,
    }
}

/// 验证文档中的示例："Hi!" 编码为一张 7x7 的图像并能原样还原
#[test]
fn test_hi_scenario() {
    let payload = BitSequence::from_text("Hi!");
    assert_eq!(payload.to_string(), "010010000110100100100001");

    let pages = encode(Content::Text("Hi!"), &Options::new());
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].dimensions(), (7, 7));
    assert_eq!(decode_text(&pages, &Options::new()), "Hi!");
}

/// 验证不加盐时，各种文本 (包括空串、含有 '!' 和数字的文本) 都能无损往返
#[test]
fn test_text_round_trip_without_salt() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut samples = vec![
        String::new(),
        "!".to_string(),
        "0".to_string(),
        "123!456!".to_string(),
        "!!!999".to_string(),
    ];
    samples.extend((0..20).map(|i| random_ascii(&mut rng, i * 13)));

    for text in samples {
        let pages = encode(Content::Text(&text), &Options::new());
        assert_eq!(pages.len(), 1);
        assert_eq!(decode_text(&pages, &Options::new()), text, "text {:?}", text);
    }
}

/// 验证所有 256 种盐值组合都能无损往返
#[test]
fn test_text_round_trip_with_every_salt() {
    let mut rng = StdRng::seed_from_u64(11);
    let text = random_ascii(&mut rng, 57);

    for mask in 0..256 {
        let options = Options::new().with_salt(salt_from_mask(mask));
        let pages = encode(Content::Text(&text), &options);
        assert_eq!(decode_text(&pages, &options), text, "salt mask {:#010b}", mask);
    }
}

/// 验证盐值错误时不会崩溃，而是返回固定提示，且绝不等于原文
#[test]
fn test_wrong_salt_is_detected() {
    let text = "The quick brown fox jumps over the lazy dog 42 times!";
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..200 {
        let encode_mask = rng.random_range(0..256u32);
        let decode_mask = rng.random_range(0..256u32);
        if encode_mask == decode_mask {
            continue;
        }

        let pages = encode(
            Content::Text(text),
            &Options::new().with_salt(salt_from_mask(encode_mask)),
        );
        let decoded = decode_text(
            &pages,
            &Options::new().with_salt(salt_from_mask(decode_mask)),
        );
        assert_ne!(decoded, text);
        assert_eq!(decoded, INVALID_SALT_MESSAGE);
    }
}

/// 验证文件内容逐字节还原，包括空文件和不是页面容量整数倍的文件
#[test]
fn test_file_bytes_are_exact() {
    let mut rng = StdRng::seed_from_u64(42);
    let page = PageSize::new(64, 64).unwrap();

    for size in [0usize, 1, 509, 510, 511, 512, 513, 1000, 4099] {
        let mut data = vec![0u8; size];
        rng.fill_bytes(&mut data);

        for options in [Options::new(), Options::new().with_page(page)] {
            let options = options.with_salt(Salt::new([0, 5]));
            let pages = encode(Content::File(&data), &options);
            let decoded = decode_file(&pages, &options).unwrap();
            assert_eq!(decoded, data, "size {}", size);
        }
    }
}

/// 验证 50,000 比特的负载按 64x64 页面分页时的页数与还原结果
#[test]
fn test_large_payload_page_count() {
    let mut data = vec![0u8; 6250];
    rand::rng().fill_bytes(&mut data);
    let options = Options::new().with_page(PageSize::new(64, 64).unwrap());

    let pages = encode(Content::File(&data), &options);
    // "6250!" is 40 bits, followed by 50,000 payload bits.
    assert_eq!(pages.len(), (40usize + 50_000).div_ceil(4096));
    assert!(pages.iter().all(|page| page.dimensions() == (64, 64)));
    assert_eq!(decode_file(&pages, &options).unwrap(), data);
}

/// 验证帧头跨越多页时仍能正确解码
#[test]
fn test_header_straddling_pages() {
    let text = "x".repeat(200);
    let options = Options::new()
        .with_page(PageSize::new(4, 4).unwrap())
        .with_salt(Salt::new([3]));

    // "1600!" is 40 bits, more than two 16-bit pages.
    let pages = encode(Content::Text(&text), &options);
    assert_eq!(pages.len(), (40usize + 1600).div_ceil(16));
    assert_eq!(decode_text(&pages, &options), text);
}

/// 验证缺页时文件解码返回截断错误，而不是错误的数据
#[test]
fn test_missing_page_is_reported() {
    let data = vec![0xA5u8; 2000];
    let options = Options::new().with_page(PageSize::new(32, 32).unwrap());

    let mut pages = encode(Content::File(&data), &options);
    pages.pop();
    assert!(matches!(
        decode_file(&pages, &options),
        Err(Error::TruncatedInput { .. })
    ));
}

/// 验证从编码到解码的完整命令行流程 (文本，加盐)
#[test]
fn test_handle_text_encode_and_decode() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let source_text_path = dir.path().join("source.txt");
    let image_path = dir.path().join("encoded.png");
    let recovered_text_path = dir.path().join("recovered.txt");

    let original_text = "This is a test message for the handler! 1234567890";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_encode_text
    let mut args = encode_args(&source_text_path, Some(image_path.clone()));
    args.salt = Some("1,4,6".parse()?);
    handle_encode_text(args)?;
    assert!(image_path.exists(), "Encoded image should be created.");

    // 3. 测试 handle_decode_text
    handle_decode_text(DecodeTextArgs {
        image: image_path.clone(),
        salt: Some("6,4,1".parse()?),
        text: Some(recovered_text_path.clone()),
        force: false,
    })?;

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&recovered_text_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text must match the original."
    );

    Ok(())
}

/// 验证文本解码时盐值错误不会让命令失败，也不会写出文件
#[test]
fn test_handle_decode_text_with_wrong_salt() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_text_path = dir.path().join("note.txt");
    let recovered_text_path = dir.path().join("note_out.txt");
    fs::write(&source_text_path, "salted secret")?;

    let mut args = encode_args(&source_text_path, None);
    args.salt = Some("2".parse()?);
    handle_encode_text(args)?;

    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("note.png"),
        salt: Some("3".parse()?),
        text: Some(recovered_text_path.clone()),
        force: false,
    })?;
    assert!(!recovered_text_path.exists());

    Ok(())
}

/// 验证多页文件的命令行流程，以及默认输出路径
#[test]
fn test_handle_multi_page_file_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let source_path = dir.path().join("data.bin");
    let mut data = vec![0u8; 5000];
    rand::rng().fill_bytes(&mut data);
    fs::write(&source_path, &data)?;

    // 2. 编码，不提供 dest 路径
    let mut args = encode_args(&source_path, None);
    args.width = Some(64);
    args.height = Some(64);
    handle_encode_file(args)?;

    // "5000!" is 40 bits, 40,040 bits over 4096-bit pages.
    for index in 0..10 {
        let page = dir.path().join(format!("data_{}.png", index));
        assert!(page.exists(), "Page should be created at: {:?}", page);
    }
    assert!(!dir.path().join("data_10.png").exists());

    // 3. 解码，不提供输出路径
    handle_decode_file(DecodeFileArgs {
        image: dir.path().join("data.png"),
        salt: None,
        dest: None,
        force: false,
    })?;

    // 4. 验证结果
    let expected_recovered_path = dir.path().join("recovered_data.bin");
    assert_eq!(fs::read(&expected_recovered_path)?, data);

    Ok(())
}

/// 验证给出任意一页的路径时，会加载整组页面
#[test]
fn test_handle_decode_from_single_page_path() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("letter.txt");
    let text = "a page set addressed by one of its pages ".repeat(20);
    fs::write(&source_path, &text)?;

    let mut args = encode_args(&source_path, Some(dir.path().join("out").join("letter.png")));
    args.width = Some(20);
    args.height = Some(20);
    handle_encode_text(args)?;

    let recovered_path = dir.path().join("letter_out.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("out").join("letter_3.png"),
        salt: None,
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, text);

    Ok(())
}

/// 验证文件解码时盐值错误会返回错误，且不会写出文件
#[test]
fn test_handle_decode_file_with_wrong_salt() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("archive.bin");
    fs::write(&source_path, [0u8, 1, 2, 3, 255, 254])?;

    let mut args = encode_args(&source_path, None);
    args.salt = Some("0,7".parse()?);
    handle_encode_file(args)?;

    let dest_path = dir.path().join("restored.bin");
    let result = handle_decode_file(DecodeFileArgs {
        image: dir.path().join("archive.png"),
        salt: Some("0".parse()?),
        dest: Some(dest_path.clone()),
        force: false,
    });

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Failed to decode a file"));
    }
    assert!(!dest_path.exists());

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let source_path = dir.path().join("long.txt");
    fs::write(&source_path, "z".repeat(3000))?;

    let mut args = encode_args(&source_path, None);
    args.width = Some(32);
    args.height = Some(32);
    handle_encode_text(args)?;
    assert!(dir.path().join("long_23.png").exists());

    // 2. 场景一：不使用 --force 时拒绝覆盖
    fs::write(&source_path, "short")?;
    let mut args = encode_args(&source_path, None);
    args.width = Some(32);
    args.height = Some(32);
    let result = handle_encode_text(args);
    assert!(result.is_err(), "Execution should fail without --force when output exists.");
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    // 3. 场景二：使用 --force 时覆盖，并清理旧的多余页面
    let mut args = encode_args(&source_path, None);
    args.width = Some(32);
    args.height = Some(32);
    args.force = true;
    handle_encode_text(args)?;
    assert!(dir.path().join("long_0.png").exists());
    assert!(!dir.path().join("long_1.png").exists());

    let recovered_path = dir.path().join("long_out.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("long.png"),
        salt: None,
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, "short");

    Ok(())
}

/// 验证页面尺寸过小时的错误处理
#[test]
fn test_handle_encode_page_too_small() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("tiny.txt");
    fs::write(&source_path, "hello")?;

    let mut args = encode_args(&source_path, None);
    args.width = Some(2);
    args.height = Some(3);
    let result = handle_encode_text(args);

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("cannot hold a single byte"));
    }

    Ok(())
}

/// 验证找不到图像时的错误处理
#[test]
fn test_handle_decode_missing_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let result = handle_decode_file(DecodeFileArgs {
        image: dir.path().join("nothing.png"),
        salt: None,
        dest: None,
        force: false,
    });

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Unable to read image(s)"));
    }

    Ok(())
}

/// 验证输出路径的扩展名决定图像格式，且无损另存后的页面仍能解码
#[test]
fn test_handle_bmp_output_and_resaved_page() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let source_path = dir.path().join("note.txt");
    let text = "saved as a bitmap, then saved again";
    fs::write(&source_path, text)?;

    // 2. 直接编码为 BMP
    handle_encode_text(encode_args(&source_path, Some(dir.path().join("out.bmp"))))?;
    assert!(dir.path().join("out.bmp").exists());
    assert!(!dir.path().join("out.png").exists());

    let recovered_path = dir.path().join("from_bmp.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("out.bmp"),
        salt: None,
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, text);

    // 3. 编码为默认的 PNG，再用其他程序的方式另存为 BMP
    let mut args = encode_args(&source_path, None);
    args.salt = Some("2,6".parse()?);
    handle_encode_text(args)?;
    image::open(dir.path().join("note.png"))?.save(dir.path().join("resaved.bmp"))?;

    let recovered_path = dir.path().join("from_resaved.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("resaved.bmp"),
        salt: Some("2,6".parse()?),
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, text);

    Ok(())
}

/// 验证多页输出使用 BMP 时，页面按同一扩展名写出和加载
#[test]
fn test_handle_multi_page_bmp_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("blob.bin");
    let data: Vec<u8> = (0..=255u8).cycle().take(700).collect();
    fs::write(&source_path, &data)?;

    let mut args = encode_args(&source_path, Some(dir.path().join("pages").join("blob.bmp")));
    args.width = Some(32);
    args.height = Some(32);
    handle_encode_file(args)?;

    // "700!" is 32 bits, 5,632 bits over 1024-bit pages.
    for index in 0..6 {
        assert!(dir.path().join("pages").join(format!("blob_{}.bmp", index)).exists());
    }
    assert!(!dir.path().join("pages").join("blob_0.png").exists());

    let dest_path = dir.path().join("blob_out.bin");
    handle_decode_file(DecodeFileArgs {
        image: dir.path().join("pages").join("blob_2.bmp"),
        salt: None,
        dest: Some(dest_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read(&dest_path)?, data);

    Ok(())
}

/// 验证有损或未知的图像格式会被拒绝
#[test]
fn test_handle_rejects_lossy_format() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("photo.txt");
    fs::write(&source_path, "not a photo")?;

    let result = handle_encode_text(encode_args(&source_path, Some(dir.path().join("photo.jpg"))));

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Unsupported image format"));
    }
    assert!(!dir.path().join("photo.jpg").exists());
    assert!(!dir.path().join("photo.png").exists());

    Ok(())
}

/// 验证还原出的文本恰好等于失败提示时，仍会被正常写出
#[test]
fn test_handle_decode_text_equal_to_failure_message() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("quote.txt");
    fs::write(&source_path, INVALID_SALT_MESSAGE)?;

    handle_encode_text(encode_args(&source_path, None))?;

    let recovered_path = dir.path().join("quote_out.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("quote.png"),
        salt: None,
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, INVALID_SALT_MESSAGE);

    Ok(())
}

/// 验证 `--force` 覆盖失败时，旧的输出保持不变
#[test]
fn test_failed_forced_encode_keeps_previous_output() -> anyhow::Result<()> {
    // 1. 准备环境：先以自动尺寸生成一张图像
    let dir = tempdir()?;
    let source_path = dir.path().join("keep.txt");
    fs::write(&source_path, "old content")?;
    handle_encode_text(encode_args(&source_path, None))?;
    assert!(dir.path().join("keep.png").exists());

    // 2. 第二页的位置被一个目录占据，写入必然失败
    fs::create_dir(dir.path().join("keep_1.png"))?;
    fs::write(&source_path, "new text ".repeat(10))?;
    let mut args = encode_args(&source_path, None);
    args.width = Some(16);
    args.height = Some(16);
    args.force = true;
    assert!(handle_encode_text(args).is_err());

    // 3. 旧图像仍然存在，并且内容未变
    assert!(dir.path().join("keep.png").exists());
    let recovered_path = dir.path().join("keep_out.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("keep.png"),
        salt: None,
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, "old content");

    Ok(())
}

/// 验证 `--force` 从多页改为单图时，旧页面在写入成功后被清理
#[test]
fn test_forced_encode_from_pages_to_single_image() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let source_path = dir.path().join("swap.txt");
    fs::write(&source_path, "paged ".repeat(50))?;

    let mut args = encode_args(&source_path, None);
    args.width = Some(16);
    args.height = Some(16);
    handle_encode_text(args)?;
    assert!(dir.path().join("swap_1.png").exists());

    fs::write(&source_path, "single")?;
    let mut args = encode_args(&source_path, None);
    args.force = true;
    handle_encode_text(args)?;

    assert!(dir.path().join("swap.png").exists());
    assert!(!dir.path().join("swap_0.png").exists());
    assert!(!dir.path().join("swap_1.png").exists());

    let recovered_path = dir.path().join("swap_out.txt");
    handle_decode_text(DecodeTextArgs {
        image: dir.path().join("swap.png"),
        salt: None,
        text: Some(recovered_path.clone()),
        force: false,
    })?;
    assert_eq!(fs::read_to_string(&recovered_path)?, "single");

    Ok(())
}
